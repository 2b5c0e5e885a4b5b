//! Message channels and their per-channel rules.
//!
//! The channel determines which simulated provider handles an outbound send
//! and which validation applies to attachments.

use crate::error::MessagingError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

/// The medium a message travels over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageChannel {
    /// Plain text message. May not carry attachments.
    Sms,
    /// Multimedia message.
    Mms,
    /// Email message.
    Email,
}

impl MessageChannel {
    /// Canonical lowercase name, as persisted and returned to clients.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Mms => "mms",
            Self::Email => "email",
        }
    }

    /// Human-readable label used in send confirmations.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Sms => "SMS",
            Self::Mms => "MMS",
            Self::Email => "Email",
        }
    }

    /// The simulated provider that carries this channel.
    #[must_use]
    pub const fn provider(&self) -> &'static str {
        match self {
            Self::Sms | Self::Mms => "twilio",
            Self::Email => "sendgrid",
        }
    }

    /// Checks the channel's attachment rule.
    ///
    /// SMS is text-only; MMS and email carry attachments freely.
    pub fn validate_attachments(&self, attachments: &[JsonValue]) -> Result<(), MessagingError> {
        if matches!(self, Self::Sms) && !attachments.is_empty() {
            return Err(MessagingError::InvalidAttachment {
                reason: "SMS cannot have attachments".to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for MessageChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageChannel {
    type Err = MessagingError;

    /// Parses a channel name case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sms" => Ok(Self::Sms),
            "mms" => Ok(Self::Mms),
            "email" => Ok(Self::Email),
            _ => Err(MessagingError::UnknownChannel {
                value: s.to_string(),
            }),
        }
    }
}
