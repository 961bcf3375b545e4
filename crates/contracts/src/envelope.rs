//! Queue wire envelope
//!
//! Shared by every transport so a consumer sees the same body regardless of
//! how it was delivered.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{validate_payload, ContractError, Message, Priority};

/// Message body as seen by queue consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeBody {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
    pub priority: Priority,
    /// RFC 3339, millisecond precision
    pub timestamp: String,
    pub retry_count: u32,
}

/// Queue-level attributes used for routing/filtering without parsing the body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageAttributes {
    #[serde(rename = "Priority")]
    pub priority: Priority,
    #[serde(rename = "MessageType")]
    pub message_type: String,
}

/// Single queue message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEnvelope {
    pub body: EnvelopeBody,
    pub attributes: MessageAttributes,
}

impl QueueEnvelope {
    /// Build the envelope, checking the payload against its kind's schema
    pub fn from_message(message: &Message) -> Result<Self, ContractError> {
        validate_payload(&message.kind, &message.payload)?;

        Ok(Self {
            body: EnvelopeBody {
                id: message.id.to_string(),
                kind: message.kind.clone(),
                data: message.payload.clone(),
                priority: message.priority,
                timestamp: message
                    .submitted_at
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
                retry_count: message.retry_count(),
            },
            attributes: MessageAttributes {
                priority: message.priority,
                message_type: message.kind.clone(),
            },
        })
    }

    /// Body serialized as a JSON string (queue `MessageBody`)
    pub fn body_json(&self) -> Result<String, ContractError> {
        Ok(serde_json::to_string(&self.body)?)
    }
}

/// One entry of a batch call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// `<message id>-<position in batch>`
    pub id: String,
    #[serde(flatten)]
    pub envelope: QueueEnvelope,
}

/// Encode a batch, preserving order. Fails on the first invalid payload.
pub fn encode_batch(messages: &[Message]) -> Result<Vec<BatchEntry>, ContractError> {
    messages
        .iter()
        .enumerate()
        .map(|(index, message)| {
            Ok(BatchEntry {
                id: format!("{}-{}", message.id, index),
                envelope: QueueEnvelope::from_message(message)?,
            })
        })
        .collect()
}
