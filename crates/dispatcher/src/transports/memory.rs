//! MemoryTransport - records calls in memory (tests, dry runs)

use contracts::{
    encode_batch, ContractError, Destination, DestinationKey, Message, QueueEnvelope, Transport,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, instrument};

/// One recorded transport call
#[derive(Debug, Clone, PartialEq)]
pub enum SentCall {
    Single {
        destination: DestinationKey,
        message: Message,
    },
    Batch {
        destination: DestinationKey,
        messages: Vec<Message>,
    },
}

impl SentCall {
    pub fn destination(&self) -> &DestinationKey {
        match self {
            Self::Single { destination, .. } | Self::Batch { destination, .. } => destination,
        }
    }

    /// Messages carried by the call, in order
    pub fn messages(&self) -> Vec<&Message> {
        match self {
            Self::Single { message, .. } => vec![message],
            Self::Batch { messages, .. } => messages.iter().collect(),
        }
    }
}

#[derive(Debug, Default)]
struct Recorder {
    calls: Vec<SentCall>,
    fail_all: bool,
    failing: HashSet<String>,
}

/// Transport that keeps every call in memory
///
/// Clones share the same record, so a test can keep one clone and hand the
/// other to a dispatcher.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    name: String,
    recorder: Arc<Mutex<Recorder>>,
}

impl MemoryTransport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            recorder: Arc::new(Mutex::new(Recorder::default())),
        }
    }

    /// Make every following call fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.lock().fail_all = failing;
    }

    /// Make calls to one destination fail
    pub fn fail_destination(&self, destination: impl Into<String>) {
        self.lock().failing.insert(destination.into());
    }

    /// All recorded calls, oldest first
    pub fn calls(&self) -> Vec<SentCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Messages delivered by `send_one`
    pub fn singles(&self) -> Vec<Message> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                SentCall::Single { message, .. } => Some(message.clone()),
                SentCall::Batch { .. } => None,
            })
            .collect()
    }

    /// Batches delivered by `send_batch`
    pub fn batches(&self) -> Vec<Vec<Message>> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                SentCall::Batch { messages, .. } => Some(messages.clone()),
                SentCall::Single { .. } => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recorder> {
        self.recorder.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_failure(&self, destination: &Destination) -> Result<(), ContractError> {
        let recorder = self.lock();
        if recorder.fail_all || recorder.failing.contains(destination.name.as_str()) {
            return Err(ContractError::transport(
                &self.name,
                destination.name.as_str(),
                "injected failure",
            ));
        }
        Ok(())
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl Transport for MemoryTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "memory_transport_send_one",
        skip(self, destination, message),
        fields(destination = %destination.name, message_id = %message.id)
    )]
    async fn send_one(
        &self,
        destination: &Destination,
        message: &Message,
    ) -> Result<(), ContractError> {
        QueueEnvelope::from_message(message)?;
        self.check_failure(destination)?;

        self.lock().calls.push(SentCall::Single {
            destination: destination.name.clone(),
            message: message.clone(),
        });
        debug!(transport = %self.name, "Recorded single send");
        Ok(())
    }

    #[instrument(
        name = "memory_transport_send_batch",
        skip(self, destination, messages),
        fields(destination = %destination.name, batch_len = messages.len())
    )]
    async fn send_batch(
        &self,
        destination: &Destination,
        messages: &[Message],
    ) -> Result<(), ContractError> {
        encode_batch(messages)?;
        self.check_failure(destination)?;

        self.lock().calls.push(SentCall::Batch {
            destination: destination.name.clone(),
            messages: messages.to_vec(),
        });
        debug!(transport = %self.name, "Recorded batch send");
        Ok(())
    }
}
