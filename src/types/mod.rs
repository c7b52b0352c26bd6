//! Core domain types.

pub mod ids;
pub mod message;
pub mod payload;

pub use ids::MessageId;
pub use message::Message;
pub use payload::{PayloadError, WebhookPayload};
