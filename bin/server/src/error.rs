//! HTTP error mapping.
//!
//! Domain errors carry internal detail; responses carry user-safe text.
//! Storage detail in particular is logged here and never returned to the
//! client.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use courier_messaging::MessagingError;
use serde_json::json;

/// An error response from an API handler.
#[derive(Debug)]
pub struct ApiError(MessagingError);

impl From<MessagingError> for ApiError {
    fn from(err: MessagingError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            MessagingError::MalformedTimestamp { .. }
            | MessagingError::InvalidAttachment { .. }
            | MessagingError::InvalidAddress { .. }
            | MessagingError::UnknownChannel { .. } => StatusCode::BAD_REQUEST,
            MessagingError::ProviderSendFailed { .. } => StatusCode::BAD_GATEWAY,
            MessagingError::ConversationNotFound { .. } => StatusCode::NOT_FOUND,
            MessagingError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match &self.0 {
            MessagingError::Storage { details } => {
                tracing::error!(details = %details, "storage failure");
                "Internal server error".to_string()
            }
            MessagingError::ConversationNotFound { .. } => "Conversation not found".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "message": self.public_message() }));
        (status, body).into_response()
    }
}
