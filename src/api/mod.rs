//! HTTP Transport
//!
//! Exposes a [`LogService`] over JSON/HTTP. Digests travel as 64-character
//! lowercase hex strings.

pub mod handlers;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::LogError;
use crate::log::LogService;

/// Shared router state
pub type AppState = (AppConfig, LogService);

/// Build the application router
pub fn router(config: AppConfig, service: LogService) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/tree/head", get(handlers::tree_head))
        .route("/tree/root/:size", get(handlers::historical_root))
        .route("/tree/nodes", get(handlers::live_nodes))
        .route("/events", post(handlers::append_event))
        .route("/proof/inclusion", get(handlers::inclusion_proof))
        .route("/proof/event", get(handlers::event_proof))
        .route("/proof/consistency", get(handlers::consistency_proof))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .into_inner(),
        )
        .with_state((config, service))
}

/// JSON body of every failed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    /// Rebuild the typed error on the client side
    pub fn into_error(self) -> LogError {
        let message = self.message;
        match self.error.as_str() {
            "out_of_range" => LogError::OutOfRange(message),
            "invalid_range" => LogError::InvalidRange(message),
            "not_found" => LogError::NotFound(message),
            "invalid_digest" => LogError::InvalidDigest(message),
            "hash_engine_unavailable" => LogError::HashEngineUnavailable(message),
            "corrupted_state" => LogError::CorruptedState(message),
            other => LogError::TransportError(format!("{}: {}", other, message)),
        }
    }
}

/// Error wrapper turning a [`LogError`] into an HTTP response
#[derive(Debug)]
pub struct ApiError(pub LogError);

impl From<LogError> for ApiError {
    fn from(err: LogError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            err if err.is_client_error() => StatusCode::BAD_REQUEST,
            LogError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.0.kind().to_string(),
            message: self.0.detail().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
