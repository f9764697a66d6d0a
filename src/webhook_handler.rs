use crate::errors::AppError;
use crate::handlers::AppState;
use crate::relay::{relay_lead, RelayOutcome};
use crate::webhook_models::{normalize, WixWebhookPayload};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

/// Response returned to the form platform after a relayed lead.
#[derive(Debug, Serialize)]
pub struct RelayResponse {
    pub status: String,
    pub contact_id: String,
    pub deal_id: String,
    pub pipeline: String,
    pub contact_reused: bool,
}

impl From<RelayOutcome> for RelayResponse {
    fn from(outcome: RelayOutcome) -> Self {
        Self {
            status: "success".to_string(),
            contact_id: outcome.contact_id,
            deal_id: outcome.deal_id,
            pipeline: outcome.pipeline,
            contact_reused: outcome.contact_reused,
        }
    }
}

/// Wix form-submission webhook handler.
///
/// Validates the optional shared secret, requires the nested `data` object
/// (rejected with 400 before any outbound call), normalizes the submission
/// and relays it to the CRM.
///
/// Authentication: X-Webhook-Token header must match WEBHOOK_SECRET when set.
pub async fn wix_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<WixWebhookPayload>,
) -> Result<(StatusCode, Json<RelayResponse>), AppError> {
    tracing::info!("Received Wix form webhook");

    validate_webhook_secret(&state, &headers)?;

    let Some(ref data) = payload.data else {
        return Err(AppError::BadRequest(
            "Missing 'data' object in webhook payload".to_string(),
        ));
    };

    let record = normalize(data);
    tracing::debug!(
        "Normalized lead: name={:?}, email={:?}, series={}",
        record.name,
        record.email,
        record.series_of_interest
    );

    let outcome = relay_lead(&state.crm, &state.config, &record).await?;

    tracing::info!(
        "Lead relayed: contact={}, deal={}, pipeline={}",
        outcome.contact_id,
        outcome.deal_id,
        outcome.pipeline
    );

    Ok((StatusCode::CREATED, Json(outcome.into())))
}

/// Validate webhook secret from X-Webhook-Token header
fn validate_webhook_secret(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    // If no secret is configured, skip validation (warn was already logged at startup)
    let Some(ref expected_secret) = state.config.webhook_secret else {
        return Ok(());
    };

    let token = headers
        .get("X-Webhook-Token")
        .or_else(|| headers.get("x-webhook-token"))
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing X-Webhook-Token header".to_string()))?;

    // Constant-time comparison to prevent timing attacks
    if !constant_time_compare(token, expected_secret) {
        tracing::warn!("Invalid webhook token received");
        return Err(AppError::Unauthorized("Invalid webhook token".to_string()));
    }

    Ok(())
}

/// Constant-time string comparison (basic implementation)
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.as_bytes()
        .iter()
        .zip(b.as_bytes().iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
