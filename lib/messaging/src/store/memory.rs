//! In-memory store for tests and local development.

use super::{MessageStore, StoreError};
use crate::conversation::Conversation;
use crate::message::Message;
use async_trait::async_trait;
use courier_core::ConversationId;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
}

/// A [`MessageStore`] backed by process memory.
///
/// One mutex guards all state, so find-or-create is trivially atomic.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn find_or_create_conversation(
        &self,
        from_addr: &str,
        to_addr: &str,
    ) -> Result<Conversation, StoreError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        if let Some(existing) = state
            .conversations
            .iter()
            .find(|c| c.involves(from_addr, to_addr))
        {
            return Ok(existing.clone());
        }

        let conversation = Conversation::new(from_addr, to_addr);
        state.conversations.push(conversation.clone());
        Ok(conversation)
    }

    async fn find_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, StoreError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state.conversations.iter().find(|c| c.id == id).cloned())
    }

    async fn insert_message(&self, message: &Message) -> Result<(), StoreError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        state.messages.push(message.clone());
        Ok(())
    }

    async fn provider_message_exists(
        &self,
        provider_message_id: &str,
    ) -> Result<bool, StoreError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state
            .messages
            .iter()
            .any(|m| m.provider_message_id.as_deref() == Some(provider_message_id)))
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>, StoreError> {
        let state = self.state.lock().expect("store mutex poisoned");
        let mut conversations = state.conversations.clone();
        conversations.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(conversations)
    }

    async fn list_messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, StoreError> {
        let state = self.state.lock().expect("store mutex poisoned");
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| (a.timestamp, a.id).cmp(&(b.timestamp, b.id)));
        Ok(messages)
    }
}
