use chrono::{DateTime, Utc};
use courier_config::PayloadFormat;
use courier_db::Message;
use courier_error::PublishError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JSON record layout used with `PayloadFormat::Envelope`
///
/// Carries the store-assigned id so the consumer can correlate a record with
/// its exact row even when several messages share the same content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub message_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for MessageEnvelope {
    fn from(message: &Message) -> Self {
        Self {
            message_id: message.id,
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }
}

/// A decoded inbound record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundPayload {
    /// Correlate by id
    Envelope(MessageEnvelope),
    /// Correlate by content equality
    Content(String),
}

/// Bytes published for `message` under `format`
pub fn encode_payload(format: PayloadFormat, message: &Message) -> Result<Vec<u8>, PublishError> {
    match format {
        PayloadFormat::Raw => Ok(message.content.as_bytes().to_vec()),
        PayloadFormat::Envelope => Ok(serde_json::to_vec(&MessageEnvelope::from(message))?),
    }
}

/// Decode an inbound record value.
///
/// Returns `None` for payloads that are neither an envelope nor valid UTF-8,
/// since such bytes cannot equal any stored content.
pub fn decode_payload(format: PayloadFormat, payload: &[u8]) -> Option<InboundPayload> {
    if format == PayloadFormat::Envelope {
        if let Ok(envelope) = serde_json::from_slice::<MessageEnvelope>(payload) {
            return Some(InboundPayload::Envelope(envelope));
        }
    }

    std::str::from_utf8(payload)
        .ok()
        .map(|content| InboundPayload::Content(content.to_string()))
}
