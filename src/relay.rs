/// Lead relay workflow: canonical record in, CRM contact + deal out.
///
/// Sequential steps, no retry, no rollback:
/// 1. Upsert contact (create-first, fall back to find-by-email on conflict)
/// 2. Resolve pipeline by name (case-insensitive)
/// 3. Resolve stage (preferred name, else lowest position)
/// 4. Create deal
///
/// A failure after contact creation leaves the contact in place; orphaned
/// contacts are accepted over duplicate deals.
use serde::Serialize;

use crate::config::Config;
use crate::crm_client::RdCrmClient;
use crate::crm_models::{CrmContact, DealPayload, Pipeline, Stage};
use crate::errors::{AppError, ResultExt};
use crate::webhook_models::ContactRecord;

/// Result of a fully relayed lead.
#[derive(Debug, Clone, Serialize)]
pub struct RelayOutcome {
    pub contact_id: String,
    pub deal_id: String,
    pub pipeline: String,
    /// True when an existing contact was reused instead of created.
    pub contact_reused: bool,
}

/// Upsert strategy: attempt creation first, fall back to find-by-email when
/// the CRM reports a conflict or validation failure for the email.
///
/// 409 is the documented duplicate answer; 422 shows up on accounts that
/// report duplicates as validation errors, so both trigger the fallback.
pub async fn upsert_contact(
    crm: &RdCrmClient,
    record: &ContactRecord,
) -> Result<(CrmContact, bool), AppError> {
    match crm.create_contact(record).await {
        Ok(contact) => Ok((contact, false)),
        Err(AppError::UpstreamRejected { status, body }) if status == 409 || status == 422 => {
            let Some(ref email) = record.email else {
                return Err(AppError::UpstreamRejected { status, body });
            };

            tracing::info!(
                "Contact creation rejected ({}), falling back to find-by-email",
                status
            );
            match crm.find_contact_by_email(email).await? {
                Some(existing) => {
                    tracing::info!("Reusing existing contact: {}", existing.id);
                    Ok((existing, true))
                }
                // Rejected but not findable either: surface the original rejection
                None => Err(AppError::UpstreamRejected { status, body }),
            }
        }
        Err(e) => Err(e),
    }
}

/// Exact case-insensitive pipeline name match.
pub fn match_pipeline(pipelines: &[Pipeline], name: &str) -> Option<Pipeline> {
    let wanted = name.to_lowercase();
    pipelines
        .iter()
        .find(|p| p.name.to_lowercase() == wanted)
        .cloned()
}

/// Pick the target stage: exact case-insensitive match on the preferred name
/// when one is configured, otherwise the stage with the lowest position.
pub fn select_stage(stages: &[Stage], preferred: Option<&str>) -> Option<Stage> {
    match preferred {
        Some(name) => stages
            .iter()
            .find(|s| s.name.to_lowercase() == name.to_lowercase())
            .cloned(),
        None => stages.iter().min_by_key(|s| s.position).cloned(),
    }
}

/// Deal title: student name, falling back to the guardian name, falling back
/// to the bare prefix.
pub fn deal_title(prefix: &str, record: &ContactRecord) -> String {
    match record.student_name.as_ref().or(record.name.as_ref()) {
        Some(person) => format!("{} - {}", prefix, person),
        None => prefix.to_string(),
    }
}

/// Relay one normalized lead into the CRM.
pub async fn relay_lead(
    crm: &RdCrmClient,
    config: &Config,
    record: &ContactRecord,
) -> Result<RelayOutcome, AppError> {
    // Step 1: upsert contact
    let (contact, contact_reused) = upsert_contact(crm, record)
        .await
        .context("upserting contact")?;

    // Step 2: resolve pipeline by name
    let pipelines = crm.list_pipelines().await.context("listing pipelines")?;
    let pipeline = match_pipeline(&pipelines, &config.pipeline_name).ok_or_else(|| {
        AppError::ConfigError(format!(
            "Pipeline '{}' not found in CRM ({} available)",
            config.pipeline_name,
            pipelines.len()
        ))
    })?;

    // Step 3: resolve stage
    let stages = crm
        .list_stages(&pipeline.id)
        .await
        .context("listing stages")?;
    if stages.is_empty() {
        return Err(AppError::ConfigError(format!(
            "Pipeline '{}' has no stages",
            pipeline.name
        )));
    }
    let stage =
        select_stage(&stages, config.preferred_stage.as_deref()).ok_or_else(|| {
            AppError::ConfigError(format!(
                "Stage '{}' not found in pipeline '{}'",
                config.preferred_stage.as_deref().unwrap_or_default(),
                pipeline.name
            ))
        })?;

    tracing::debug!(
        "Resolved pipeline '{}' ({}) stage '{}' ({})",
        pipeline.name,
        pipeline.id,
        stage.name,
        stage.id
    );

    // Step 4: create deal
    let deal = DealPayload {
        name: deal_title(&config.deal_title_prefix, record),
        amount: 0.0,
        currency: "BRL".to_string(),
        deal_pipeline_id: pipeline.id.clone(),
        deal_stage_id: stage.id.clone(),
        contact_id: contact.id.clone(),
        origin_note: config.deal_source.clone(),
    };
    let created = crm.create_deal(&deal).await.context("creating deal")?;

    Ok(RelayOutcome {
        contact_id: contact.id,
        deal_id: created.id,
        pipeline: pipeline.name,
        contact_reused,
    })
}
