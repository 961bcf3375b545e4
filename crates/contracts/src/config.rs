//! DispatchConfig - Config Loader output
//!
//! Describes the full dispatcher setup: batching knobs, transport selection and
//! the destination → endpoint routing table.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use validator::Validate;

use crate::{ContractError, Destination};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete dispatcher configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DispatchConfig {
    #[serde(default)]
    pub version: ConfigVersion,

    /// Batching / dedup settings
    #[serde(default)]
    #[validate(nested)]
    pub dispatcher: DispatcherSettings,

    /// Transport selection
    #[serde(default)]
    pub transport: TransportConfig,

    /// Destination name -> endpoint. An empty endpoint means "declared but not configured".
    #[serde(default)]
    pub destinations: BTreeMap<String, String>,
}

impl DispatchConfig {
    /// Run the declarative field checks
    pub fn check(&self) -> Result<(), ContractError> {
        self.validate()
            .map_err(|e| ContractError::config_validation("dispatcher", e.to_string()))
    }

    /// Resolve a destination name to its endpoint
    ///
    /// # Errors
    /// - `UnknownDestination` if the name is not declared
    /// - `EndpointNotConfigured` if its endpoint is empty
    pub fn resolve(&self, name: &str) -> Result<Destination, ContractError> {
        let endpoint = self
            .destinations
            .get(name)
            .ok_or_else(|| ContractError::unknown_destination(name))?;

        if endpoint.trim().is_empty() {
            return Err(ContractError::EndpointNotConfigured {
                destination: name.to_string(),
            });
        }

        Ok(Destination::new(name, endpoint.trim()))
    }

    /// Destinations that currently resolve
    pub fn configured_destinations(&self) -> Vec<Destination> {
        self.destinations
            .keys()
            .filter_map(|name| self.resolve(name).ok())
            .collect()
    }
}

/// Batching and deduplication settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct DispatcherSettings {
    /// Buffered messages per destination that trigger an immediate flush
    #[serde(default = "default_batch_size")]
    #[validate(range(min = 1, message = "batch_size must be >= 1"))]
    pub batch_size: usize,

    /// Flush timer delay
    #[serde(default = "default_batch_delay_ms")]
    #[validate(range(min = 1, message = "batch_delay_ms must be >= 1"))]
    pub batch_delay_ms: u64,

    /// Max fingerprints kept for deduplication (FIFO)
    #[serde(default = "default_dedup_capacity")]
    #[validate(range(min = 1, message = "dedup_capacity must be >= 1"))]
    pub dedup_capacity: usize,

    /// Buffered flush failures per subscriber before the oldest are skipped
    #[serde(default = "default_failure_channel_capacity")]
    #[validate(range(min = 1, message = "failure_channel_capacity must be >= 1"))]
    pub failure_channel_capacity: usize,
}

impl DispatcherSettings {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            dedup_capacity: default_dedup_capacity(),
            failure_channel_capacity: default_failure_channel_capacity(),
        }
    }
}

fn default_batch_size() -> usize {
    10
}

fn default_batch_delay_ms() -> u64 {
    1000
}

fn default_dedup_capacity() -> usize {
    1000
}

fn default_failure_channel_capacity() -> usize {
    64
}

/// Transport type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Log envelopes via tracing
    #[default]
    Log,
    /// Append JSON lines to files
    File,
    /// POST to an HTTP queue endpoint
    Http,
    /// Keep in memory (tests, dry runs)
    Memory,
}

/// Transport configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Transport type
    #[serde(default)]
    pub kind: TransportKind,

    /// Transport-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}
