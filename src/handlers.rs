use crate::config::Config;
use crate::crm_client::RdCrmClient;
use axum::{http::StatusCode, Json};
use chrono::Utc;
use serde_json::json;

/// Shared application state injected into handlers.
///
/// Built once at startup; request handlers never read ambient environment
/// state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Client for the RD Station CRM API.
    pub crm: RdCrmClient,
}

/// Health check endpoint.
///
/// Unauthenticated liveness probe: status, service name and current UTC time.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "lead-relay-api",
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}
