//! HTTP surface: the six messaging endpoints.
//!
//! Send endpoints surface validation and provider errors; webhook endpoints
//! acknowledge every delivery with 200 because the provider cannot act on a
//! 4xx/5xx — client-error failures there are logged and dropped. Read
//! endpoints go straight to storage.

use crate::error::ApiError;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use courier_core::ConversationId;
use courier_messaging::{
    Conversation, InboundMessage, Message, MessageChannel, MessageService, MessagingError,
    OutboundMessage,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// The ingestion and query service.
    pub service: Arc<MessageService>,
}

/// Builds the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/messages/sms", post(send_sms))
        .route("/api/messages/email", post(send_email))
        .route("/api/webhooks/sms", post(inbound_sms_webhook))
        .route("/api/webhooks/email", post(inbound_email_webhook))
        .route("/api/conversations", get(list_conversations))
        .route("/api/conversations/{id}/messages", get(list_messages))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Body of SMS/MMS send and webhook requests.
#[derive(Debug, Deserialize)]
struct SmsBody {
    from: String,
    to: String,
    body: Option<String>,
    #[serde(rename = "type")]
    message_type: Option<String>,
    attachments: Option<Vec<JsonValue>>,
    messaging_provider_id: Option<String>,
    timestamp: Option<String>,
}

/// Body of email send and webhook requests.
#[derive(Debug, Deserialize)]
struct EmailBody {
    from: String,
    to: String,
    body: Option<String>,
    attachments: Option<Vec<JsonValue>>,
    xillio_id: Option<String>,
    timestamp: Option<String>,
}

fn sms_channel(message_type: Option<&str>) -> Result<MessageChannel, MessagingError> {
    match message_type {
        None => Ok(MessageChannel::Sms),
        Some(value) => MessageChannel::from_str(value),
    }
}

async fn send_sms(
    State(state): State<AppState>,
    Json(body): Json<SmsBody>,
) -> Result<Json<JsonValue>, ApiError> {
    let channel = sms_channel(body.message_type.as_deref())?;
    let confirmation = state
        .service
        .send(OutboundMessage {
            from: body.from,
            to: body.to,
            body: body.body,
            channel,
            attachments: body.attachments.unwrap_or_default(),
            provider_message_id: body.messaging_provider_id,
            timestamp: body.timestamp.map(Into::into),
        })
        .await?;

    Ok(Json(json!({ "message": confirmation.detail })))
}

async fn send_email(
    State(state): State<AppState>,
    Json(body): Json<EmailBody>,
) -> Result<Json<JsonValue>, ApiError> {
    let confirmation = state
        .service
        .send(OutboundMessage {
            from: body.from,
            to: body.to,
            body: body.body,
            channel: MessageChannel::Email,
            attachments: body.attachments.unwrap_or_default(),
            provider_message_id: body.xillio_id,
            timestamp: body.timestamp.map(Into::into),
        })
        .await?;

    Ok(Json(json!({ "message": confirmation.detail })))
}

/// Acknowledges a webhook delivery, downgrading client errors to an ack.
fn webhook_ack(
    result: Result<courier_messaging::InboundReceipt, MessagingError>,
    ack: &'static str,
) -> Result<Json<JsonValue>, ApiError> {
    match result {
        Ok(_) => Ok(Json(json!({ "message": ack }))),
        Err(err) if err.is_client_error() => {
            tracing::warn!(error = %err, "invalid webhook delivery acknowledged without record");
            Ok(Json(json!({ "message": ack })))
        }
        Err(err) => Err(err.into()),
    }
}

async fn inbound_sms_webhook(
    State(state): State<AppState>,
    Json(body): Json<SmsBody>,
) -> Result<Json<JsonValue>, ApiError> {
    let ack = "Incoming SMS received successfully!";
    let channel = match sms_channel(body.message_type.as_deref()) {
        Ok(channel) => channel,
        Err(err) => return webhook_ack(Err(err), ack),
    };

    let result = state
        .service
        .record_inbound(InboundMessage {
            from: body.from,
            to: body.to,
            body: body.body,
            channel,
            attachments: body.attachments.unwrap_or_default(),
            provider_message_id: body.messaging_provider_id,
            timestamp: body.timestamp.map(Into::into),
        })
        .await;

    webhook_ack(result, ack)
}

async fn inbound_email_webhook(
    State(state): State<AppState>,
    Json(body): Json<EmailBody>,
) -> Result<Json<JsonValue>, ApiError> {
    let result = state
        .service
        .record_inbound(InboundMessage {
            from: body.from,
            to: body.to,
            body: body.body,
            channel: MessageChannel::Email,
            attachments: body.attachments.unwrap_or_default(),
            provider_message_id: body.xillio_id,
            timestamp: body.timestamp.map(Into::into),
        })
        .await;

    webhook_ack(result, "Incoming email received successfully!")
}

/// A conversation summary as returned to clients.
#[derive(Debug, Serialize)]
struct ConversationView {
    id: String,
    participants: [String; 2],
    created_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationView {
    fn from(conversation: Conversation) -> Self {
        Self {
            id: conversation.id.to_string(),
            participants: [conversation.participant_a, conversation.participant_b],
            created_at: conversation.created_at,
        }
    }
}

async fn list_conversations(
    State(state): State<AppState>,
) -> Result<Json<Vec<ConversationView>>, ApiError> {
    let conversations = state.service.conversations().await?;
    Ok(Json(
        conversations.into_iter().map(ConversationView::from).collect(),
    ))
}

/// A message as returned to clients.
#[derive(Debug, Serialize)]
struct MessageView {
    from: String,
    to: String,
    body: Option<String>,
    timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    message_type: MessageChannel,
    attachments: Vec<JsonValue>,
}

impl From<Message> for MessageView {
    fn from(message: Message) -> Self {
        Self {
            from: message.from_address,
            to: message.to_address,
            body: message.body,
            timestamp: message.timestamp,
            message_type: message.channel,
            attachments: message.attachments,
        }
    }
}

async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<MessageView>>, ApiError> {
    // Ids are opaque to clients, so an unparseable id is indistinguishable
    // from an unknown one.
    let conversation_id = ConversationId::from_str(&id)
        .map_err(|_| MessagingError::ConversationNotFound { id: id.clone() })?;

    let messages = state.service.conversation_messages(conversation_id).await?;
    Ok(Json(messages.into_iter().map(MessageView::from).collect()))
}
