//! Message ingestion and read-side queries.
//!
//! [`MessageService`] is the single entry point for both ingestion paths:
//! outbound sends (validated, pushed through the provider gateway, then
//! persisted) and inbound webhook deliveries (deduplicated by provider
//! correlation id, then persisted). Read queries bypass ingestion and go
//! straight to the store.

use crate::channel::MessageChannel;
use crate::error::MessagingError;
use crate::message::Message;
use crate::provider::{MockProvider, SendPayload};
use crate::store::MessageStore;
use crate::timestamp::{self, TimestampInput};
use crate::{Conversation, StoreError};
use courier_core::ConversationId;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// A request to send a message through a provider.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Message body.
    pub body: Option<String>,
    /// Channel to send over.
    pub channel: MessageChannel,
    /// Attachment descriptors.
    pub attachments: Vec<JsonValue>,
    /// Provider correlation id, when the caller already has one.
    pub provider_message_id: Option<String>,
    /// External timestamp, if supplied.
    pub timestamp: Option<TimestampInput>,
}

/// An inbound message delivered by a provider webhook.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Message body.
    pub body: Option<String>,
    /// Channel the message arrived on.
    pub channel: MessageChannel,
    /// Attachment descriptors.
    pub attachments: Vec<JsonValue>,
    /// Provider correlation id used for deduplication.
    pub provider_message_id: Option<String>,
    /// External timestamp, if supplied.
    pub timestamp: Option<TimestampInput>,
}

/// Confirmation returned for a successful outbound send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendConfirmation {
    /// Human-readable confirmation, e.g. "SMS sent to +15550002".
    pub detail: String,
    /// The conversation the message was recorded under.
    pub conversation_id: ConversationId,
}

/// Result of recording an inbound webhook delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundReceipt {
    /// A new message was recorded.
    Recorded,
    /// The correlation id was already known; nothing was recorded.
    Duplicate,
}

/// Ingestion and query service over a [`MessageStore`] and the provider
/// gateway.
pub struct MessageService {
    store: Arc<dyn MessageStore>,
    provider: MockProvider,
}

impl MessageService {
    /// Creates a service over the given store and provider gateway.
    #[must_use]
    pub fn new(store: Arc<dyn MessageStore>, provider: MockProvider) -> Self {
        Self { store, provider }
    }

    /// Sends an outbound message and records it.
    ///
    /// Validation (addresses, attachment rule, timestamp) happens before
    /// the provider call; a provider failure aborts the operation before
    /// any message is persisted.
    ///
    /// # Errors
    ///
    /// [`MessagingError::InvalidAddress`], [`MessagingError::InvalidAttachment`]
    /// or [`MessagingError::MalformedTimestamp`] for bad input;
    /// [`MessagingError::ProviderSendFailed`] when retries are exhausted;
    /// [`MessagingError::Storage`] on persistence failure.
    pub async fn send(&self, outbound: OutboundMessage) -> Result<SendConfirmation, MessagingError> {
        require_address("from", &outbound.from)?;
        require_address("to", &outbound.to)?;
        outbound.channel.validate_attachments(&outbound.attachments)?;
        let timestamp = timestamp::normalize(outbound.timestamp)?;

        let conversation = self
            .store
            .find_or_create_conversation(&outbound.from, &outbound.to)
            .await
            .map_err(storage)?;

        let payload = SendPayload {
            to: outbound.to.clone(),
            body: outbound.body.clone(),
        };
        let receipt = self
            .provider
            .send(outbound.channel.provider(), &payload)
            .await;
        if !receipt.success {
            return Err(MessagingError::ProviderSendFailed {
                detail: receipt
                    .error_detail
                    .unwrap_or_else(|| "provider send failed".to_string()),
            });
        }

        let message = Message::new(
            conversation.id,
            outbound.from,
            outbound.to.clone(),
            outbound.body,
            outbound.channel,
            outbound.attachments,
            outbound.provider_message_id,
            timestamp,
        );
        self.store.insert_message(&message).await.map_err(storage)?;

        tracing::info!(
            conversation = %conversation.id,
            message = %message.id,
            channel = %outbound.channel,
            "outbound message recorded"
        );

        Ok(SendConfirmation {
            detail: format!("{} sent to {}", outbound.channel.label(), outbound.to),
            conversation_id: conversation.id,
        })
    }

    /// Records an inbound webhook delivery.
    ///
    /// Deliveries carrying an already-seen correlation id are acknowledged
    /// without creating a record, making provider retries idempotent. No
    /// provider call is made and attachments are not validated.
    ///
    /// # Errors
    ///
    /// [`MessagingError::InvalidAddress`] or
    /// [`MessagingError::MalformedTimestamp`] for bad input (callers on the
    /// webhook surface acknowledge these instead of surfacing them);
    /// [`MessagingError::Storage`] on persistence failure.
    pub async fn record_inbound(
        &self,
        inbound: InboundMessage,
    ) -> Result<InboundReceipt, MessagingError> {
        if let Some(correlation_id) = inbound
            .provider_message_id
            .as_deref()
            .filter(|id| !id.is_empty())
        {
            let duplicate = self
                .store
                .provider_message_exists(correlation_id)
                .await
                .map_err(storage)?;
            if duplicate {
                tracing::info!(
                    provider_message_id = correlation_id,
                    channel = %inbound.channel,
                    "duplicate webhook delivery ignored"
                );
                return Ok(InboundReceipt::Duplicate);
            }
        }

        require_address("from", &inbound.from)?;
        require_address("to", &inbound.to)?;
        let timestamp = timestamp::normalize(inbound.timestamp)?;

        let conversation = self
            .store
            .find_or_create_conversation(&inbound.from, &inbound.to)
            .await
            .map_err(storage)?;

        let message = Message::new(
            conversation.id,
            inbound.from,
            inbound.to,
            inbound.body,
            inbound.channel,
            inbound.attachments,
            inbound.provider_message_id,
            timestamp,
        );
        self.store.insert_message(&message).await.map_err(storage)?;

        tracing::info!(
            conversation = %conversation.id,
            message = %message.id,
            channel = %inbound.channel,
            "inbound message recorded"
        );

        Ok(InboundReceipt::Recorded)
    }

    /// All conversations, ordered by `(created_at, id)` ascending.
    pub async fn conversations(&self) -> Result<Vec<Conversation>, MessagingError> {
        self.store.list_conversations().await.map_err(storage)
    }

    /// All messages of a conversation in `(timestamp, id)` order.
    ///
    /// # Errors
    ///
    /// [`MessagingError::ConversationNotFound`] when no conversation has
    /// the given id.
    pub async fn conversation_messages(
        &self,
        id: ConversationId,
    ) -> Result<Vec<Message>, MessagingError> {
        let conversation = self
            .store
            .find_conversation(id)
            .await
            .map_err(storage)?
            .ok_or_else(|| MessagingError::conversation_not_found(id))?;

        self.store
            .list_messages(conversation.id)
            .await
            .map_err(storage)
    }
}

fn require_address(field: &'static str, value: &str) -> Result<(), MessagingError> {
    if value.is_empty() {
        return Err(MessagingError::InvalidAddress { field });
    }
    Ok(())
}

fn storage(err: StoreError) -> MessagingError {
    MessagingError::Storage {
        details: err.details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{OutcomeSource, RetryPolicy, SendOutcome};
    use crate::store::memory::InMemoryStore;
    use std::time::Duration;

    struct AlwaysDeliver;

    impl OutcomeSource for AlwaysDeliver {
        fn draw(&self, _provider: &str) -> SendOutcome {
            SendOutcome::Delivered
        }
    }

    struct NeverDeliver;

    impl OutcomeSource for NeverDeliver {
        fn draw(&self, _provider: &str) -> SendOutcome {
            SendOutcome::ServerError
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    fn service_with(outcomes: Arc<dyn OutcomeSource>) -> (MessageService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let provider = MockProvider::new(outcomes, fast_policy());
        (MessageService::new(store.clone(), provider), store)
    }

    fn sms(from: &str, to: &str, body: &str) -> OutboundMessage {
        OutboundMessage {
            from: from.to_string(),
            to: to.to_string(),
            body: Some(body.to_string()),
            channel: MessageChannel::Sms,
            attachments: Vec::new(),
            provider_message_id: None,
            timestamp: None,
        }
    }

    fn inbound_sms(provider_message_id: Option<&str>) -> InboundMessage {
        InboundMessage {
            from: "+15550001".to_string(),
            to: "+15550002".to_string(),
            body: Some("hello".to_string()),
            channel: MessageChannel::Sms,
            attachments: Vec::new(),
            provider_message_id: provider_message_id.map(str::to_string),
            timestamp: None,
        }
    }

    #[tokio::test]
    async fn send_records_message_and_confirms() {
        let (service, _) = service_with(Arc::new(AlwaysDeliver));
        let confirmation = service.send(sms("+15550001", "+15550002", "hi")).await.unwrap();

        assert_eq!(confirmation.detail, "SMS sent to +15550002");
        let messages = service
            .conversation_messages(confirmation.conversation_id)
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].channel, MessageChannel::Sms);
        assert_eq!(messages[0].body.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn sms_with_attachments_is_rejected_without_side_effects() {
        let (service, store) = service_with(Arc::new(AlwaysDeliver));
        let mut outbound = sms("+15550001", "+15550002", "hi");
        outbound.attachments = vec![serde_json::json!({"url": "https://example.com/a.png"})];

        let err = service.send(outbound).await.unwrap_err();
        assert_eq!(err.to_string(), "SMS cannot have attachments");
        // Rejected before resolution: no conversation, no message.
        assert!(store.list_conversations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn email_with_attachments_succeeds() {
        let (service, _) = service_with(Arc::new(AlwaysDeliver));
        let outbound = OutboundMessage {
            channel: MessageChannel::Email,
            attachments: vec![serde_json::json!({"url": "https://example.com/report.pdf"})],
            ..sms("alice@example.com", "bob@example.com", "see attached")
        };

        let confirmation = service.send(outbound).await.unwrap();
        assert_eq!(confirmation.detail, "Email sent to bob@example.com");
        let messages = service
            .conversation_messages(confirmation.conversation_id)
            .await
            .unwrap();
        assert_eq!(messages[0].attachments.len(), 1);
    }

    #[tokio::test]
    async fn provider_failure_persists_no_message() {
        let (service, store) = service_with(Arc::new(NeverDeliver));
        let err = service.send(sms("+15550001", "+15550002", "hi")).await.unwrap_err();

        assert_eq!(
            err,
            MessagingError::ProviderSendFailed {
                detail: "Provider failed after retries".to_string()
            }
        );
        // The conversation was resolved before the send, but no message exists.
        let conversations = store.list_conversations().await.unwrap();
        assert_eq!(conversations.len(), 1);
        assert!(
            store
                .list_messages(conversations[0].id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn malformed_timestamp_fails_before_provider_call() {
        let (service, store) = service_with(Arc::new(AlwaysDeliver));
        let mut outbound = sms("+15550001", "+15550002", "hi");
        outbound.timestamp = Some("soon-ish".into());

        let err = service.send(outbound).await.unwrap_err();
        assert!(matches!(err, MessagingError::MalformedTimestamp { .. }));
        assert!(store.list_conversations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_address_is_rejected() {
        let (service, _) = service_with(Arc::new(AlwaysDeliver));
        let err = service.send(sms("", "+15550002", "hi")).await.unwrap_err();
        assert_eq!(err, MessagingError::InvalidAddress { field: "from" });
    }

    #[tokio::test]
    async fn duplicate_webhook_stores_exactly_one_message() {
        let (service, _) = service_with(Arc::new(AlwaysDeliver));

        let first = service.record_inbound(inbound_sms(Some("SM42"))).await.unwrap();
        let second = service.record_inbound(inbound_sms(Some("SM42"))).await.unwrap();

        assert_eq!(first, InboundReceipt::Recorded);
        assert_eq!(second, InboundReceipt::Duplicate);

        let conversations = service.conversations().await.unwrap();
        assert_eq!(conversations.len(), 1);
        let messages = service
            .conversation_messages(conversations[0].id)
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn webhook_without_correlation_id_never_dedups() {
        let (service, _) = service_with(Arc::new(AlwaysDeliver));

        service.record_inbound(inbound_sms(None)).await.unwrap();
        service.record_inbound(inbound_sms(None)).await.unwrap();
        // Empty string behaves like absent.
        service.record_inbound(inbound_sms(Some(""))).await.unwrap();

        let conversations = service.conversations().await.unwrap();
        let messages = service
            .conversation_messages(conversations[0].id)
            .await
            .unwrap();
        assert_eq!(messages.len(), 3);
    }

    #[tokio::test]
    async fn webhook_makes_no_provider_call() {
        // NeverDeliver would fail any send; inbound recording must not care.
        let (service, _) = service_with(Arc::new(NeverDeliver));
        let receipt = service.record_inbound(inbound_sms(Some("SM1"))).await.unwrap();
        assert_eq!(receipt, InboundReceipt::Recorded);
    }

    #[tokio::test]
    async fn webhook_skips_attachment_validation() {
        let (service, _) = service_with(Arc::new(AlwaysDeliver));
        let mut inbound = inbound_sms(Some("SM7"));
        inbound.attachments = vec![serde_json::json!({"url": "https://example.com/media.jpg"})];

        // An SMS-typed inbound with attachments is still recorded.
        let receipt = service.record_inbound(inbound).await.unwrap();
        assert_eq!(receipt, InboundReceipt::Recorded);
    }

    #[tokio::test]
    async fn outbound_and_inbound_share_a_conversation() {
        let (service, _) = service_with(Arc::new(AlwaysDeliver));

        let confirmation = service.send(sms("+15550001", "+15550002", "hi")).await.unwrap();
        // The reply arrives with addresses reversed.
        let mut reply = inbound_sms(Some("SM9"));
        reply.from = "+15550002".to_string();
        reply.to = "+15550001".to_string();
        service.record_inbound(reply).await.unwrap();

        let conversations = service.conversations().await.unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].id, confirmation.conversation_id);
        let messages = service
            .conversation_messages(confirmation.conversation_id)
            .await
            .unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn unknown_conversation_is_not_found() {
        let (service, _) = service_with(Arc::new(AlwaysDeliver));
        let err = service
            .conversation_messages(ConversationId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MessagingError::ConversationNotFound { .. }));
    }
}
