//! Layered error definitions
//!
//! Categorized by source: config / destination / payload / transport

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Destination Errors =====
    /// Destination key not present in the configuration
    #[error("unknown destination '{destination}'")]
    UnknownDestination { destination: String },

    /// Destination is declared but has no endpoint
    #[error("endpoint not configured for destination '{destination}'")]
    EndpointNotConfigured { destination: String },

    // ===== Payload Errors =====
    /// Payload does not match the schema of its kind
    #[error("invalid payload for kind '{kind}': {message}")]
    InvalidPayload { kind: String, message: String },

    /// Envelope encoding error
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    // ===== Transport Errors =====
    /// Remote send failed
    #[error("transport '{transport}' failed for '{destination}': {message}")]
    Transport {
        transport: String,
        destination: String,
        message: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create unknown destination error
    pub fn unknown_destination(destination: impl Into<String>) -> Self {
        Self::UnknownDestination {
            destination: destination.into(),
        }
    }

    /// Create invalid payload error
    pub fn invalid_payload(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create transport error
    pub fn transport(
        transport: impl Into<String>,
        destination: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Transport {
            transport: transport.into(),
            destination: destination.into(),
            message: message.into(),
        }
    }

    /// Whether this error is caused by configuration rather than delivery
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse { .. }
                | Self::ConfigValidation { .. }
                | Self::UnknownDestination { .. }
                | Self::EndpointNotConfigured { .. }
        )
    }
}
