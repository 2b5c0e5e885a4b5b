//! Conversation records.
//!
//! A conversation is the unordered-pair grouping of all messages exchanged
//! between two addresses. Pair order is insignificant for identity, but the
//! stored columns preserve first-seen orientation: `participant_a` is
//! whichever address was the sender when the conversation was created.

use chrono::{DateTime, Utc};
use courier_core::ConversationId;
use serde::{Deserialize, Serialize};

/// A conversation between two participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Opaque conversation identifier.
    pub id: ConversationId,
    /// First-seen sender address.
    pub participant_a: String,
    /// First-seen recipient address.
    pub participant_b: String,
    /// When the first message between the pair was ingested.
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Creates a conversation for a first message from `from_addr` to
    /// `to_addr`.
    #[must_use]
    pub fn new(from_addr: impl Into<String>, to_addr: impl Into<String>) -> Self {
        Self {
            id: ConversationId::new(),
            participant_a: from_addr.into(),
            participant_b: to_addr.into(),
            created_at: Utc::now(),
        }
    }

    /// Canonical `(min, max)` ordering of the participant pair.
    ///
    /// Two conversations describe the same pair iff their keys are equal;
    /// storage backends enforce uniqueness on this key.
    #[must_use]
    pub fn pair_key(&self) -> (&str, &str) {
        canonical_pair(&self.participant_a, &self.participant_b)
    }

    /// True if this conversation is between the given unordered pair.
    #[must_use]
    pub fn involves(&self, addr_x: &str, addr_y: &str) -> bool {
        self.pair_key() == canonical_pair(addr_x, addr_y)
    }
}

/// Orders two addresses canonically, smallest first.
#[must_use]
pub fn canonical_pair<'a>(x: &'a str, y: &'a str) -> (&'a str, &'a str) {
    if x <= y { (x, y) } else { (y, x) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_key_is_order_insensitive() {
        let forward = Conversation::new("+15550001", "+15550002");
        let reverse = Conversation::new("+15550002", "+15550001");
        assert_eq!(forward.pair_key(), reverse.pair_key());
    }

    #[test]
    fn creation_preserves_first_seen_orientation() {
        let conversation = Conversation::new("+15550002", "+15550001");
        assert_eq!(conversation.participant_a, "+15550002");
        assert_eq!(conversation.participant_b, "+15550001");
    }

    #[test]
    fn involves_matches_either_direction() {
        let conversation = Conversation::new("alice@example.com", "bob@example.com");
        assert!(conversation.involves("bob@example.com", "alice@example.com"));
        assert!(!conversation.involves("alice@example.com", "carol@example.com"));
    }
}
