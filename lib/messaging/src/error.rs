//! Error types for message ingestion and querying.
//!
//! Variants map one-to-one onto the HTTP statuses the server surfaces:
//! client errors (malformed timestamp, invalid attachment or address,
//! unknown channel), upstream failure (provider send), not-found, and
//! storage failures fatal to the request.

use courier_core::ConversationId;
use std::fmt;

/// Errors from ingestion and query operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagingError {
    /// A textual timestamp did not parse as ISO-8601.
    MalformedTimestamp { value: String },
    /// The channel's attachment rule was violated.
    InvalidAttachment { reason: String },
    /// A participant address was missing or empty.
    InvalidAddress { field: &'static str },
    /// The requested message type is not one of sms, mms, email.
    UnknownChannel { value: String },
    /// The provider simulator exhausted its retries.
    ProviderSendFailed { detail: String },
    /// No conversation exists with the given id.
    ConversationNotFound { id: String },
    /// The storage layer failed; fatal to the request.
    Storage { details: String },
}

impl MessagingError {
    /// Wraps a conversation id into a not-found error.
    #[must_use]
    pub fn conversation_not_found(id: ConversationId) -> Self {
        Self::ConversationNotFound { id: id.to_string() }
    }

    /// True for errors caused by the client's request rather than by this
    /// service or its dependencies. Webhook handlers acknowledge these
    /// instead of surfacing them.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedTimestamp { .. }
                | Self::InvalidAttachment { .. }
                | Self::InvalidAddress { .. }
                | Self::UnknownChannel { .. }
        )
    }
}

impl fmt::Display for MessagingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedTimestamp { value } => {
                write!(f, "malformed timestamp '{value}'")
            }
            Self::InvalidAttachment { reason } => f.write_str(reason),
            Self::InvalidAddress { field } => {
                write!(f, "'{field}' must be a non-empty address")
            }
            Self::UnknownChannel { value } => {
                write!(f, "unknown message type '{value}'")
            }
            Self::ProviderSendFailed { detail } => f.write_str(detail),
            Self::ConversationNotFound { id } => {
                write!(f, "conversation '{id}' not found")
            }
            Self::Storage { details } => {
                write!(f, "storage error: {details}")
            }
        }
    }
}

impl std::error::Error for MessagingError {}
