//! Dispatcher error types

use contracts::ContractError;
use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Destination unknown or endpoint missing; nothing was recorded
    #[error("configuration error: {0}")]
    Configuration(#[source] ContractError),

    /// Payload could not be turned into a message
    #[error("invalid payload: {0}")]
    Payload(#[source] ContractError),

    /// Transport call failed (immediate send or synchronous flush)
    #[error("delivery to '{destination}' failed: {source}")]
    Transport {
        destination: String,
        #[source]
        source: ContractError,
    },

    /// Transport creation error
    #[error("failed to create transport '{name}': {message}")]
    TransportCreation { name: String, message: String },

    /// Submission after `shutdown()`
    #[error("dispatcher is shut down")]
    ShutDown,
}

impl DispatchError {
    /// Create a transport creation error
    pub fn transport_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a delivery error for a destination
    pub fn transport(destination: impl Into<String>, source: ContractError) -> Self {
        Self::Transport {
            destination: destination.into(),
            source,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
