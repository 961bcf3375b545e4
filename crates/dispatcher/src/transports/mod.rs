//! Transport implementations
//!
//! Contains LogTransport, FileTransport, HttpTransport and MemoryTransport,
//! plus `AnyTransport` for picking one from configuration.

mod file;
mod http;
mod log;
mod memory;

pub use self::file::{FileTransport, FileTransportConfig};
pub use self::http::{HttpTransport, HttpTransportConfig};
pub use self::log::LogTransport;
pub use self::memory::{MemoryTransport, SentCall};

use contracts::{ContractError, Destination, Message, Transport, TransportConfig, TransportKind};
use tracing::instrument;

use crate::error::DispatchError;

/// Transport chosen at runtime from `TransportConfig`
pub enum AnyTransport {
    Log(LogTransport),
    File(FileTransport),
    Http(HttpTransport),
    Memory(MemoryTransport),
}

impl Transport for AnyTransport {
    fn name(&self) -> &str {
        match self {
            Self::Log(t) => t.name(),
            Self::File(t) => t.name(),
            Self::Http(t) => t.name(),
            Self::Memory(t) => t.name(),
        }
    }

    async fn send_one(
        &self,
        destination: &Destination,
        message: &Message,
    ) -> Result<(), ContractError> {
        match self {
            Self::Log(t) => t.send_one(destination, message).await,
            Self::File(t) => t.send_one(destination, message).await,
            Self::Http(t) => t.send_one(destination, message).await,
            Self::Memory(t) => t.send_one(destination, message).await,
        }
    }

    async fn send_batch(
        &self,
        destination: &Destination,
        messages: &[Message],
    ) -> Result<(), ContractError> {
        match self {
            Self::Log(t) => t.send_batch(destination, messages).await,
            Self::File(t) => t.send_batch(destination, messages).await,
            Self::Http(t) => t.send_batch(destination, messages).await,
            Self::Memory(t) => t.send_batch(destination, messages).await,
        }
    }
}

/// Create a transport from configuration
#[instrument(name = "dispatcher_create_transport", skip(config), fields(kind = ?config.kind))]
pub fn create_transport(config: &TransportConfig) -> Result<AnyTransport, DispatchError> {
    match config.kind {
        TransportKind::Log => Ok(AnyTransport::Log(LogTransport::new("log"))),
        TransportKind::File => FileTransport::from_params("file", &config.params)
            .map(AnyTransport::File)
            .map_err(|e| DispatchError::transport_creation("file", e.to_string())),
        TransportKind::Http => HttpTransport::from_params("http", &config.params)
            .map(AnyTransport::Http)
            .map_err(|e| DispatchError::transport_creation("http", e)),
        TransportKind::Memory => Ok(AnyTransport::Memory(MemoryTransport::new("memory"))),
    }
}
