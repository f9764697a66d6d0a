use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub rd_base_url: String,
    pub rd_token: String,
    /// Legacy deployments pass the token as a `token` query parameter
    /// instead of the Authorization header.
    pub rd_token_in_query: bool,
    pub pipeline_name: String,
    /// Preferred stage name. When unset, the lowest-position stage of the
    /// resolved pipeline is used.
    pub preferred_stage: Option<String>,
    pub deal_title_prefix: String,
    pub deal_source: String,
    /// Shared secret for the inbound webhook. When unset, validation is skipped.
    pub webhook_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            rd_base_url: std::env::var("RD_BASE_URL")
                .unwrap_or_else(|_| "https://crm.rdstation.com/api/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
            rd_token: std::env::var("RD_TOKEN")
                .map_err(|_| anyhow::anyhow!("RD_TOKEN environment variable required"))
                .and_then(|token| {
                    if token.trim().is_empty() {
                        anyhow::bail!("RD_TOKEN cannot be empty");
                    }
                    Ok(token)
                })?,
            rd_token_in_query: std::env::var("RD_TOKEN_IN_QUERY")
                .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes"))
                .unwrap_or(false),
            pipeline_name: std::env::var("RD_PIPELINE_NAME")
                .map_err(|_| anyhow::anyhow!("RD_PIPELINE_NAME environment variable required"))
                .and_then(|name| {
                    if name.trim().is_empty() {
                        anyhow::bail!("RD_PIPELINE_NAME cannot be empty");
                    }
                    Ok(name)
                })?,
            preferred_stage: std::env::var("RD_STAGE_NAME")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            deal_title_prefix: std::env::var("DEAL_TITLE_PREFIX")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "Matrícula".to_string()),
            deal_source: std::env::var("DEAL_SOURCE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "Lead recebido via formulário do site".to_string()),
            webhook_secret: std::env::var("WEBHOOK_SECRET")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        };

        if !config.rd_base_url.starts_with("http://") && !config.rd_base_url.starts_with("https://")
        {
            anyhow::bail!("RD_BASE_URL must start with http:// or https://");
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("RD Base URL: {}", config.rd_base_url);
        tracing::debug!("Pipeline: {}", config.pipeline_name);
        if let Some(ref stage) = config.preferred_stage {
            tracing::debug!("Preferred stage: {}", stage);
        }
        if config.rd_token_in_query {
            tracing::info!("Legacy query-token authentication enabled");
        }
        if config.webhook_secret.is_none() {
            tracing::warn!("WEBHOOK_SECRET not set, inbound webhook is unauthenticated");
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
