//! Inbound webhook payload and its validation rules.
//!
//! Serde handles shape (required fields, types); `validate` enforces the
//! provider's field formats. Unknown fields are ignored, matching the
//! provider's habit of adding metadata without notice.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use super::{Message, MessageId};

/// Maximum accepted length of the text body, in characters.
const MAX_TEXT_LEN: usize = 4096;

/// Errors produced by payload validation.
///
/// The message names the offending field so the sender can fix its
/// payload; it never echoes field contents beyond what is needed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("message_id must be non-empty")]
    EmptyMessageId,

    #[error("{field} must be an MSISDN of the form +<digits>")]
    InvalidMsisdn { field: &'static str },

    #[error("ts must match YYYY-MM-DDTHH:MM:SSZ")]
    InvalidTimestamp,

    #[error("text must be at most {} characters", MAX_TEXT_LEN)]
    TextTooLong,
}

/// The body of a `POST /webhook` request.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    pub message_id: MessageId,

    #[serde(rename = "from")]
    pub from_msisdn: String,

    #[serde(rename = "to")]
    pub to_msisdn: String,

    pub ts: String,

    #[serde(default)]
    pub text: String,
}

impl WebhookPayload {
    /// Checks the provider's field formats.
    pub fn validate(&self) -> Result<(), PayloadError> {
        if self.message_id.as_str().is_empty() {
            return Err(PayloadError::EmptyMessageId);
        }
        if !is_msisdn(&self.from_msisdn) {
            return Err(PayloadError::InvalidMsisdn { field: "from" });
        }
        if !is_msisdn(&self.to_msisdn) {
            return Err(PayloadError::InvalidMsisdn { field: "to" });
        }
        if !is_wire_timestamp(&self.ts) {
            return Err(PayloadError::InvalidTimestamp);
        }
        if self.text.chars().count() > MAX_TEXT_LEN {
            return Err(PayloadError::TextTooLong);
        }
        Ok(())
    }

    /// Converts a validated payload into the record to persist,
    /// stamping the server-assigned receive time.
    pub fn into_message(self, received_at: DateTime<Utc>) -> Message {
        Message {
            message_id: self.message_id,
            from_msisdn: self.from_msisdn,
            to_msisdn: self.to_msisdn,
            ts: self.ts,
            text: self.text,
            received_at,
        }
    }
}

/// An MSISDN is a `+` followed by at least one digit, nothing else.
fn is_msisdn(s: &str) -> bool {
    match s.strip_prefix('+') {
        Some(rest) => !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// The provider sends second-precision UTC timestamps: `YYYY-MM-DDTHH:MM:SSZ`.
fn is_wire_timestamp(s: &str) -> bool {
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%SZ").is_ok()
}
