//! Language Lab Server
//!
//! Provides HTTP and WebSocket endpoints for the tutor agent.

pub mod http;
pub mod metrics;
pub mod state;
pub mod websocket;

pub use http::create_router;
pub use metrics::{init_metrics, metrics_handler, record_error, record_turn};
pub use state::AppState;
pub use websocket::{ClientMessage, ServerMessage, WebSocketHandler};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use lingua_agent::AgentError;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not configured: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AgentError> for ServerError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::EmptyUtterance => ServerError::InvalidRequest(err.to_string()),
            AgentError::SttUnavailable => ServerError::Unavailable(err.to_string()),
            AgentError::Transcription(_) => ServerError::Internal(err.to_string()),
        }
    }
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let status: StatusCode = self.into();
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
