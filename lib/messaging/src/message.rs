//! Message records.

use crate::channel::MessageChannel;
use chrono::{DateTime, Utc};
use courier_core::{ConversationId, MessageId};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A message within a conversation.
///
/// Immutable once persisted; its lifetime is bounded by the owning
/// conversation (cascade deletion removes messages with it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Opaque message identifier.
    pub id: MessageId,
    /// The conversation this message belongs to.
    pub conversation_id: ConversationId,
    /// Sender address.
    pub from_address: String,
    /// Recipient address.
    pub to_address: String,
    /// Message body; optional for non-text channels.
    pub body: Option<String>,
    /// The channel the message travelled over.
    pub channel: MessageChannel,
    /// Attachment descriptors, in order. Empty for text-only messages.
    pub attachments: Vec<JsonValue>,
    /// External correlation id from the provider, when known.
    /// Used to deduplicate inbound webhook deliveries.
    pub provider_message_id: Option<String>,
    /// Normalized message timestamp.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a message record ready to persist.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        conversation_id: ConversationId,
        from_address: impl Into<String>,
        to_address: impl Into<String>,
        body: Option<String>,
        channel: MessageChannel,
        attachments: Vec<JsonValue>,
        provider_message_id: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            from_address: from_address.into(),
            to_address: to_address.into(),
            body,
            channel,
            attachments,
            provider_message_id,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn message_serde_roundtrip() {
        let msg = Message::new(
            ConversationId::new(),
            "+15550001",
            "+15550002",
            Some("hello".to_string()),
            MessageChannel::Sms,
            Vec::new(),
            Some("SM123".to_string()),
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        );

        let json = serde_json::to_string(&msg).expect("serialize");
        let parsed: Message = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(msg, parsed);
    }
}
