//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Delivery Model
//! - A [`Message`] targets one [`DestinationKey`], resolved through [`DispatchConfig`]
//! - Transports receive messages individually or as ordered batches
//! - [`QueueEnvelope`] is the wire shape every transport emits

mod config;
mod destination_key;
mod envelope;
mod error;
mod message;
mod payload;
mod transport;

pub use config::*;
pub use destination_key::DestinationKey;
pub use envelope::*;
pub use error::*;
pub use message::*;
pub use payload::*;
pub use transport::{Destination, LocalTransport, Transport};
