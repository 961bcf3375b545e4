//! LogTransport - logs wire envelopes via tracing

use contracts::{encode_batch, ContractError, Destination, Message, QueueEnvelope, Transport};
use tracing::{debug, info, instrument};

/// Transport that only logs what would be sent (development)
pub struct LogTransport {
    name: String,
}

impl LogTransport {
    /// Create a new LogTransport with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Transport for LogTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_transport_send_one",
        skip(self, destination, message),
        fields(destination = %destination.name, message_id = %message.id)
    )]
    async fn send_one(
        &self,
        destination: &Destination,
        message: &Message,
    ) -> Result<(), ContractError> {
        let envelope = QueueEnvelope::from_message(message)?;
        info!(
            transport = %self.name,
            endpoint = %destination.endpoint,
            kind = %envelope.attributes.message_type,
            priority = %envelope.attributes.priority,
            body = %envelope.body_json()?,
            "Message sent"
        );
        Ok(())
    }

    #[instrument(
        name = "log_transport_send_batch",
        skip(self, destination, messages),
        fields(destination = %destination.name, batch_len = messages.len())
    )]
    async fn send_batch(
        &self,
        destination: &Destination,
        messages: &[Message],
    ) -> Result<(), ContractError> {
        let entries = encode_batch(messages)?;
        for entry in &entries {
            debug!(
                transport = %self.name,
                entry_id = %entry.id,
                kind = %entry.envelope.attributes.message_type,
                "Batch entry"
            );
        }
        info!(
            transport = %self.name,
            endpoint = %destination.endpoint,
            entries = entries.len(),
            "Batch sent"
        );
        Ok(())
    }
}
