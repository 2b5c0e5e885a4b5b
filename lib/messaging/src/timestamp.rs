//! Timestamp normalization for ingested messages.
//!
//! Providers supply timestamps in slightly different ISO-8601 spellings, or
//! not at all. Everything is normalized to a UTC instant before persistence.

use crate::error::MessagingError;
use chrono::{DateTime, NaiveDateTime, Utc};

/// An externally supplied timestamp, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum TimestampInput {
    /// Already a native instant; passed through unchanged.
    Instant(DateTime<Utc>),
    /// A textual ISO-8601 timestamp still to be parsed.
    Text(String),
}

impl From<DateTime<Utc>> for TimestampInput {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::Instant(instant)
    }
}

impl From<String> for TimestampInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for TimestampInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Normalizes an optional external timestamp to a UTC instant.
///
/// Absent or empty input defaults to the current ingestion time. A trailing
/// literal `Z` is treated as the `+00:00` offset. A naive datetime with no
/// offset is interpreted as UTC.
///
/// # Errors
///
/// Returns [`MessagingError::MalformedTimestamp`] when textual input does
/// not parse as ISO-8601.
pub fn normalize(input: Option<TimestampInput>) -> Result<DateTime<Utc>, MessagingError> {
    match input {
        None => Ok(Utc::now()),
        Some(TimestampInput::Instant(instant)) => Ok(instant),
        Some(TimestampInput::Text(text)) if text.is_empty() => Ok(Utc::now()),
        Some(TimestampInput::Text(text)) => parse_iso8601(&text),
    }
}

fn parse_iso8601(text: &str) -> Result<DateTime<Utc>, MessagingError> {
    let with_offset = match text.strip_suffix('Z') {
        Some(stripped) => format!("{stripped}+00:00"),
        None => text.to_string(),
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&with_offset) {
        return Ok(parsed.with_timezone(&Utc));
    }

    // No offset at all: accept a naive datetime and pin it to UTC.
    with_offset
        .parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(|_| MessagingError::MalformedTimestamp {
            value: text.to_string(),
        })
}
