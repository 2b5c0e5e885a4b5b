//! Storage seam for conversations and messages.
//!
//! The service talks to storage exclusively through [`MessageStore`], so the
//! HTTP server can wire the Postgres implementation while tests run against
//! [`memory::InMemoryStore`]. Implementations own the atomicity of
//! find-or-create: two concurrent ingestions for a previously-unseen pair
//! must still yield exactly one conversation.

pub mod memory;

use crate::conversation::Conversation;
use crate::message::Message;
use async_trait::async_trait;
use courier_core::ConversationId;
use std::fmt;

/// A storage-layer failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    /// Backend-specific detail.
    pub details: String,
}

impl StoreError {
    /// Creates a store error from any displayable cause.
    #[must_use]
    pub fn new(details: impl fmt::Display) -> Self {
        Self {
            details: details.to_string(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store error: {}", self.details)
    }
}

impl std::error::Error for StoreError {}

/// Persistent storage for conversations and their messages.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Returns the conversation for the unordered pair `{from_addr,
    /// to_addr}`, creating it (with `participant_a = from_addr`) if none
    /// exists. Atomic under concurrent callers.
    async fn find_or_create_conversation(
        &self,
        from_addr: &str,
        to_addr: &str,
    ) -> Result<Conversation, StoreError>;

    /// Looks up a conversation by id.
    async fn find_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, StoreError>;

    /// Persists a message.
    async fn insert_message(&self, message: &Message) -> Result<(), StoreError>;

    /// Existence check for an inbound correlation id, across all
    /// conversations.
    async fn provider_message_exists(
        &self,
        provider_message_id: &str,
    ) -> Result<bool, StoreError>;

    /// All conversations, ordered by `(created_at, id)` ascending.
    async fn list_conversations(&self) -> Result<Vec<Conversation>, StoreError>;

    /// All messages of a conversation, ordered by `(timestamp, id)`
    /// ascending.
    async fn list_messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, StoreError>;
}
