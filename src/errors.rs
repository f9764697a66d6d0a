use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-specific error types.
///
/// Each variant corresponds to one failure class the relay can hit:
/// bad inbound payloads, CRM rejections (status and body preserved verbatim),
/// service misconfiguration (pipeline/stage not resolvable) and plain
/// network/timeout failures.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Bad request error (invalid input). No outbound calls were made.
    BadRequest(String),
    /// Unauthorized access error (webhook token mismatch).
    Unauthorized(String),
    /// The CRM answered a non-2xx status. Carries the upstream status code
    /// and response body untouched so callers can diagnose without replaying.
    UpstreamRejected {
        /// HTTP status returned by the CRM.
        status: u16,
        /// Raw response body returned by the CRM.
        body: String,
    },
    /// Named pipeline or stage could not be resolved remotely. This is a
    /// deployment problem, not a per-event condition.
    ConfigError(String),
    /// Network or timeout failure on an outbound call.
    TransportError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::UpstreamRejected { status, body } => {
                write!(f, "CRM rejected request ({}): {}", status, body)
            }
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::TransportError(msg) => write!(f, "Transport error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Maps each error variant to an appropriate HTTP status code and JSON body.
    /// Upstream rejections keep the CRM status and body in the payload.
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "status": "error", "error": msg }),
            ),
            AppError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized access: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    json!({ "status": "error", "error": "Unauthorized" }),
                )
            }
            AppError::UpstreamRejected {
                status: upstream,
                body,
            } => {
                tracing::error!("CRM rejected request: status={}, body={}", upstream, body);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({
                        "status": "error",
                        "error": "CRM rejected request",
                        "upstream_status": upstream,
                        "upstream_body": body,
                    }),
                )
            }
            AppError::ConfigError(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "status": "error", "error": msg }),
                )
            }
            AppError::TransportError(msg) => {
                tracing::error!("Transport error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "status": "error", "error": "CRM unreachable" }),
                )
            }
            AppError::WithContext { source, context } => {
                // Log full context chain, delegate to the underlying error's response
                tracing::error!("Error with context: {} -> {}", context, source);
                return source.clone().into_response();
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    /// Converts a `reqwest::Error` into an `AppError`.
    ///
    /// Anything reqwest surfaces (connect, timeout, body read) is a transport
    /// failure; upstream rejections are built explicitly from status + body.
    fn from(err: reqwest::Error) -> Self {
        AppError::TransportError(err.to_string())
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_rejection_keeps_status_and_body() {
        let err = AppError::UpstreamRejected {
            status: 500,
            body: "{\"errors\":\"boom\"}".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn context_wraps_source() {
        let result: Result<(), AppError> =
            Err(AppError::ConfigError("pipeline not found".to_string()));
        let wrapped = result.context("resolving pipeline").unwrap_err();
        assert!(wrapped.to_string().contains("resolving pipeline"));
        assert!(wrapped.to_string().contains("pipeline not found"));
    }
}
