//! Messaging domain for courier.
//!
//! This crate holds the messaging-history core: conversation identity
//! resolution for unordered participant pairs, outbound and inbound message
//! ingestion with webhook deduplication, the mock provider gateway with its
//! retry loop, and the storage seam the HTTP server implements over
//! Postgres.

pub mod channel;
pub mod conversation;
pub mod error;
pub mod ingest;
pub mod message;
pub mod provider;
pub mod store;
pub mod timestamp;

pub use channel::MessageChannel;
pub use conversation::Conversation;
pub use error::MessagingError;
pub use ingest::{
    InboundMessage, InboundReceipt, MessageService, OutboundMessage, SendConfirmation,
};
pub use message::Message;
pub use provider::{
    MockProvider, OutcomeSource, RetryPolicy, SendOutcome, SendPayload, SendReceipt,
    UniformOutcomes,
};
pub use store::{MessageStore, StoreError};
pub use timestamp::TimestampInput;
