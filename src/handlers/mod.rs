pub mod health;
pub mod performance;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::directory::LookupError;

// ─── Unified error type ──────────────────────────────────────────

/// Errors raised before a stream starts. Once the event stream is open,
/// failures end the body instead.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("lookup unavailable: {0}")]
    Lookup(#[from] LookupError),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Lookup(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error":  self.to_string(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
