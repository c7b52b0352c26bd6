//! The persisted message record.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::MessageId;

/// A message as stored and served back to readers.
///
/// Once inserted a message is immutable: no update or delete path exists.
/// `received_at` is assigned by the server when the first insert succeeds
/// and is never changed by later deliveries of the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Message {
    /// Sender-assigned idempotency key.
    pub message_id: MessageId,

    /// Originating MSISDN.
    #[serde(rename = "from")]
    #[sqlx(rename = "from_msisdn")]
    pub from_msisdn: String,

    /// Destination MSISDN.
    #[serde(rename = "to")]
    #[sqlx(rename = "to_msisdn")]
    pub to_msisdn: String,

    /// Sender-supplied timestamp, stored verbatim.
    pub ts: String,

    /// Free-form text body.
    pub text: String,

    /// Server-assigned time of the first successful insert.
    pub received_at: DateTime<Utc>,
}
