//! Postgres implementation of the messaging store.
//!
//! Conversation identity for an unordered address pair is enforced by a
//! unique expression index on `(LEAST(a, b), GREATEST(a, b))`; creation
//! goes through `INSERT … ON CONFLICT DO NOTHING RETURNING` so two
//! concurrent ingestions of a new pair converge on a single row. Column
//! order still records first-seen orientation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_core::ConversationId;
use courier_messaging::{Conversation, Message, MessageStore, StoreError};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

/// Row type for conversation queries.
#[derive(FromRow)]
struct ConversationRow {
    id: String,
    participant_a: String,
    participant_b: String,
    created_at: DateTime<Utc>,
}

impl ConversationRow {
    fn try_into_record(self) -> Result<Conversation, StoreError> {
        let id = ConversationId::from_str(&self.id)
            .map_err(|e| StoreError::new(format!("invalid conversation id '{}': {}", self.id, e)))?;

        Ok(Conversation {
            id,
            participant_a: self.participant_a,
            participant_b: self.participant_b,
            created_at: self.created_at,
        })
    }
}

/// Row type for message queries.
#[derive(FromRow)]
struct MessageRow {
    id: String,
    conversation_id: String,
    from_address: String,
    to_address: String,
    body: Option<String>,
    message_type: String,
    attachments: Option<serde_json::Value>,
    provider_message_id: Option<String>,
    timestamp: DateTime<Utc>,
}

impl MessageRow {
    fn try_into_record(self) -> Result<Message, StoreError> {
        let id = self
            .id
            .parse()
            .map_err(|e| StoreError::new(format!("invalid message id '{}': {}", self.id, e)))?;
        let conversation_id = ConversationId::from_str(&self.conversation_id).map_err(|e| {
            StoreError::new(format!(
                "invalid conversation id '{}': {}",
                self.conversation_id, e
            ))
        })?;
        let channel = self
            .message_type
            .parse()
            .map_err(|e| StoreError::new(format!("invalid message type: {e}")))?;
        let attachments = match self.attachments {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| StoreError::new(format!("invalid attachments column: {e}")))?,
            None => Vec::new(),
        };

        Ok(Message {
            id,
            conversation_id,
            from_address: self.from_address,
            to_address: self.to_address,
            body: self.body,
            channel,
            attachments,
            provider_message_id: self.provider_message_id,
            timestamp: self.timestamp,
        })
    }
}

/// [`MessageStore`] backed by a Postgres pool.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a store over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by_pair(
        &self,
        from_addr: &str,
        to_addr: &str,
    ) -> Result<Option<Conversation>, StoreError> {
        let row: Option<ConversationRow> = sqlx::query_as(
            r#"
            SELECT id, participant_a, participant_b, created_at
            FROM conversations
            WHERE (participant_a = $1 AND participant_b = $2)
               OR (participant_a = $2 AND participant_b = $1)
            "#,
        )
        .bind(from_addr)
        .bind(to_addr)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::new)?;

        match row {
            Some(r) => Ok(Some(r.try_into_record()?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl MessageStore for PgStore {
    async fn find_or_create_conversation(
        &self,
        from_addr: &str,
        to_addr: &str,
    ) -> Result<Conversation, StoreError> {
        if let Some(existing) = self.find_by_pair(from_addr, to_addr).await? {
            return Ok(existing);
        }

        let candidate = Conversation::new(from_addr, to_addr);
        let inserted: Option<ConversationRow> = sqlx::query_as(
            r#"
            INSERT INTO conversations (id, participant_a, participant_b, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (
                (LEAST(participant_a, participant_b)),
                (GREATEST(participant_a, participant_b))
            ) DO NOTHING
            RETURNING id, participant_a, participant_b, created_at
            "#,
        )
        .bind(candidate.id.to_string())
        .bind(&candidate.participant_a)
        .bind(&candidate.participant_b)
        .bind(candidate.created_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::new)?;

        if let Some(row) = inserted {
            return row.try_into_record();
        }

        // Lost the insert race: the winner's row must exist now.
        self.find_by_pair(from_addr, to_addr)
            .await?
            .ok_or_else(|| StoreError::new("conversation vanished after conflicting insert"))
    }

    async fn find_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, StoreError> {
        let row: Option<ConversationRow> = sqlx::query_as(
            r#"
            SELECT id, participant_a, participant_b, created_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::new)?;

        match row {
            Some(r) => Ok(Some(r.try_into_record()?)),
            None => Ok(None),
        }
    }

    async fn insert_message(&self, message: &Message) -> Result<(), StoreError> {
        let attachments =
            serde_json::to_value(&message.attachments).map_err(StoreError::new)?;

        sqlx::query(
            r#"
            INSERT INTO messages
                (id, conversation_id, from_address, to_address, body,
                 message_type, attachments, provider_message_id, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(message.id.to_string())
        .bind(message.conversation_id.to_string())
        .bind(&message.from_address)
        .bind(&message.to_address)
        .bind(&message.body)
        .bind(message.channel.as_str())
        .bind(&attachments)
        .bind(&message.provider_message_id)
        .bind(message.timestamp)
        .execute(&self.pool)
        .await
        .map_err(StoreError::new)?;

        Ok(())
    }

    async fn provider_message_exists(
        &self,
        provider_message_id: &str,
    ) -> Result<bool, StoreError> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM messages WHERE provider_message_id = $1
            )
            "#,
        )
        .bind(provider_message_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::new)?;

        Ok(exists)
    }

    async fn list_conversations(&self) -> Result<Vec<Conversation>, StoreError> {
        let rows: Vec<ConversationRow> = sqlx::query_as(
            r#"
            SELECT id, participant_a, participant_b, created_at
            FROM conversations
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::new)?;

        rows.into_iter().map(|r| r.try_into_record()).collect()
    }

    async fn list_messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, StoreError> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            r#"
            SELECT id, conversation_id, from_address, to_address, body,
                   message_type, attachments, provider_message_id, timestamp
            FROM messages
            WHERE conversation_id = $1
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(conversation_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::new)?;

        rows.into_iter().map(|r| r.try_into_record()).collect()
    }
}
