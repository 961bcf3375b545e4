//! Message - Dispatcher input/output unit
//!
//! A message is created once at submission and then travels unchanged
//! (apart from its attempt counter) through buffers and transports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{ContractError, DestinationKey};

/// Delivery priority
///
/// `High` bypasses batching; `Medium` and `Low` share the batch path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Wire representation (`"HIGH"`, `"MEDIUM"`, `"LOW"`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }

    /// Whether messages of this priority skip the batch buffers
    pub fn is_immediate(&self) -> bool {
        matches!(self, Self::High)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HIGH" => Ok(Self::High),
            "MEDIUM" => Ok(Self::Medium),
            "LOW" => Ok(Self::Low),
            other => Err(ContractError::config_validation(
                "priority",
                format!("unknown priority '{other}', expected HIGH, MEDIUM or LOW"),
            )),
        }
    }
}

/// Outbound message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique id, generated at submission
    pub id: Uuid,

    /// Target destination
    pub destination: DestinationKey,

    /// Semantic type tag (e.g. `"OTP_EMAIL"`)
    pub kind: String,

    /// Opaque payload, passed through verbatim
    pub payload: Value,

    pub priority: Priority,

    /// Creation time (UTC)
    pub submitted_at: DateTime<Utc>,

    /// Number of delivery calls this message has been part of
    pub delivery_attempts: u32,
}

impl Message {
    /// Create a message with a fresh id stamped with the current time
    pub fn new(
        destination: impl Into<DestinationKey>,
        kind: impl Into<String>,
        payload: Value,
        priority: Priority,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            destination: destination.into(),
            kind: kind.into(),
            payload,
            priority,
            submitted_at: Utc::now(),
            delivery_attempts: 0,
        }
    }

    /// Count one more delivery call
    pub fn record_attempt(&mut self) {
        self.delivery_attempts = self.delivery_attempts.saturating_add(1);
    }

    /// Retries so far (attempts after the first)
    pub fn retry_count(&self) -> u32 {
        self.delivery_attempts.saturating_sub(1)
    }
}
