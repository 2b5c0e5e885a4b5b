//! Core identifier types for the courier messaging-history service.
//!
//! Every persisted entity is keyed by a prefixed ULID, giving ids that are
//! unique, opaque to clients, and lexicographically ordered by creation time.

pub mod id;

pub use id::{ConversationId, MessageId, ParseIdError};
