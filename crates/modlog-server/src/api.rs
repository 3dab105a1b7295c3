//! Shared API types and the event ingest handler.

use crate::AppState;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use modlog_pipeline::RawEvent;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Handler for `POST /api/events`.
///
/// Queues one raw event for the pipeline. Never waits for a full queue.
pub async fn ingest_event_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(event): Json<RawEvent>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let kind = event.kind();
    match state.events.try_send(event) {
        Ok(()) => Ok((StatusCode::ACCEPTED, Json(json!({ "accepted": kind })))),
        Err(TrySendError::Full(_)) => {
            tracing::warn!(kind, "event queue full, rejecting event");
            Err(ApiError::Unavailable("event queue full".to_string()))
        }
        Err(TrySendError::Closed(_)) => {
            tracing::error!(kind, "event pipeline is not running");
            Err(ApiError::Unavailable("event pipeline stopped".to_string()))
        }
    }
}
