//! Transport trait - Dispatcher output interface
//!
//! Defines the abstract interface for queue transports.

use serde::{Deserialize, Serialize};

use crate::{ContractError, DestinationKey, Message};

/// Resolved destination: logical name plus transport-specific endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub name: DestinationKey,
    /// Queue URL, file stem, ... depending on the transport
    pub endpoint: String,
}

impl Destination {
    pub fn new(name: impl Into<DestinationKey>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// Outbound transport trait
///
/// Both calls are opaque remote operations: a batch either succeeds or fails
/// as a whole from the caller's point of view.
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    /// Transport name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver a single message
    ///
    /// # Errors
    /// Returns transport error (should include context)
    async fn send_one(
        &self,
        destination: &Destination,
        message: &Message,
    ) -> Result<(), ContractError>;

    /// Deliver a batch, in slice order
    async fn send_batch(
        &self,
        destination: &Destination,
        messages: &[Message],
    ) -> Result<(), ContractError>;
}
