use crate::config::Config;
use crate::crm_models::{ContactListResponse, CrmContact, CrmDeal, DealPayload, Pipeline, Stage};
use crate::errors::AppError;
use crate::webhook_models::ContactRecord;
use reqwest::{Method, RequestBuilder};
use std::time::Duration;

/// Client for the RD Station CRM REST API.
///
/// Authentication is a bearer token header by default; legacy deployments
/// pass the same token as a `token` query parameter instead
/// (`rd_token_in_query`).
#[derive(Clone)]
pub struct RdCrmClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    token_in_query: bool,
}

impl RdCrmClient {
    pub fn new(base_url: String, token: String, token_in_query: bool) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::TransportError(format!("Failed to create CRM client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            token,
            token_in_query,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config.rd_base_url.clone(),
            config.rd_token.clone(),
            config.rd_token_in_query,
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let req = self.client.request(method, url);
        if self.token_in_query {
            req.query(&[("token", self.token.as_str())])
        } else {
            req.header("Authorization", format!("Bearer {}", self.token))
        }
    }

    /// Turn a non-2xx CRM response into an `UpstreamRejected` error,
    /// preserving status and body verbatim.
    async fn rejection(response: reqwest::Response) -> AppError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        AppError::UpstreamRejected { status, body }
    }

    /// Look a contact up by email. Returns `None` when the CRM has no match.
    pub async fn find_contact_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CrmContact>, AppError> {
        tracing::info!("Looking up CRM contact by email: {}", email);

        let response = self
            .request(Method::GET, "/contacts")
            .query(&[("email", email)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let parsed: ContactListResponse = response.json().await.map_err(|e| {
            AppError::TransportError(format!("Failed to parse contact list: {}", e))
        })?;

        Ok(parsed.contacts.into_iter().next())
    }

    /// Create a contact from the canonical record.
    pub async fn create_contact(&self, record: &ContactRecord) -> Result<CrmContact, AppError> {
        tracing::info!(
            "Creating CRM contact: name={:?}, email={:?}",
            record.name,
            record.email
        );

        let body = crate::crm_models::contact_payload(record);
        let response = self
            .request(Method::POST, "/contacts")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let contact: CrmContact = response.json().await.map_err(|e| {
            AppError::TransportError(format!("Failed to parse created contact: {}", e))
        })?;

        tracing::info!("Contact created: {}", contact.id);
        Ok(contact)
    }

    pub async fn list_pipelines(&self) -> Result<Vec<Pipeline>, AppError> {
        let response = self.request(Method::GET, "/deal_pipelines").send().await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let pipelines: Vec<Pipeline> = response.json().await.map_err(|e| {
            AppError::TransportError(format!("Failed to parse pipeline list: {}", e))
        })?;

        Ok(pipelines)
    }

    pub async fn list_stages(&self, pipeline_id: &str) -> Result<Vec<Stage>, AppError> {
        let response = self
            .request(Method::GET, "/deal_stages")
            .query(&[("pipeline_id", pipeline_id)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let stages: Vec<Stage> = response
            .json()
            .await
            .map_err(|e| AppError::TransportError(format!("Failed to parse stage list: {}", e)))?;

        Ok(stages)
    }

    pub async fn create_deal(&self, deal: &DealPayload) -> Result<CrmDeal, AppError> {
        tracing::info!(
            "Creating CRM deal '{}' on pipeline {} stage {}",
            deal.name,
            deal.deal_pipeline_id,
            deal.deal_stage_id
        );

        let response = self
            .request(Method::POST, "/deals")
            .json(deal)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let created: CrmDeal = response.json().await.map_err(|e| {
            AppError::TransportError(format!("Failed to parse created deal: {}", e))
        })?;

        tracing::info!("Deal created: {}", created.id);
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = RdCrmClient::new(
            "https://crm.example.com/api/v1".to_string(),
            "token".to_string(),
            false,
        );
        assert!(client.is_ok());
    }
}
