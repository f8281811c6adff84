use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::chat::ChatError;
use crate::db::StoreError;

pub const CHAT_FAILED: &str = "There was a problem contacting the assistant.";
pub const DELETE_FAILED: &str = "Could not delete the conversation.";
pub const STORE_UNAVAILABLE: &str = "Database unavailable";

/// Error returned to clients. Internal detail only goes to the log.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("malformed body: {0}")]
    Body(#[from] JsonRejection),

    #[error("store unavailable")]
    Unavailable,

    #[error("{context}: {source}")]
    Internal {
        context: &'static str,
        #[source]
        source: ChatError,
    },
}

impl ApiError {
    /// Translate an orchestrator failure, using `context` as the client-facing
    /// message for anything that is not the caller's fault.
    pub fn from_chat(context: &'static str, err: ChatError) -> Self {
        match err {
            ChatError::EmptyHistory => ApiError::Validation(ChatError::EmptyHistory.to_string()),
            ChatError::Store(StoreError::Unavailable) => ApiError::Unavailable,
            source => ApiError::Internal { context, source },
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Body(rejection) => (rejection.status(), rejection.body_text()),
            ApiError::Unavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, STORE_UNAVAILABLE.to_string())
            }
            ApiError::Internal { context, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
            }
        };

        if status.is_server_error() {
            tracing::error!(%status, error = %self, "Request failed");
        } else {
            tracing::info!(%status, error = %self, "Request rejected");
        }

        (status, axum::Json(ErrorBody { detail })).into_response()
    }
}
