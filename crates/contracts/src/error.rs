//! Layered error definitions
//!
//! Categorized by source: config / destination / encode / transport

use std::fmt;
use thiserror::Error;

/// Why a delivery failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportFailure {
    /// Name resolution failed or produced no candidates
    HostNotFound,
    /// A candidate rejected or dropped the connection
    ConnectionRefused,
    /// An operation exceeded the destination timeout
    Timeout,
    /// Every allowed connection attempt failed
    Exhausted,
}

impl TransportFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HostNotFound => "host not found",
            Self::ConnectionRefused => "connection refused",
            Self::Timeout => "timeout",
            Self::Exhausted => "retries exhausted",
        }
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

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

    /// Destination could not be bound from its options
    #[error("destination '{alias}': {message}")]
    Destination { alias: String, message: String },

    // ===== Encoding Errors =====
    /// A single record could not be rendered
    #[error("cannot encode '{path}': {message}")]
    Encode { path: String, message: String },

    // ===== Transport Errors =====
    /// Delivery to a destination failed
    #[error("{failure} for {endpoint}: {message}")]
    Transport {
        endpoint: String,
        failure: TransportFailure,
        message: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
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

    /// Create destination binding error
    pub fn destination(alias: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Destination {
            alias: alias.into(),
            message: message.into(),
        }
    }

    /// Create record encoding error
    pub fn encode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Encode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create transport error
    pub fn transport(
        endpoint: impl Into<String>,
        failure: TransportFailure,
        message: impl Into<String>,
    ) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            failure,
            message: message.into(),
        }
    }

    /// Transport failure kind, if this is a transport error
    pub fn transport_failure(&self) -> Option<TransportFailure> {
        match self {
            Self::Transport { failure, .. } => Some(*failure),
            _ => None,
        }
    }

    /// Whether this error stems from configuration rather than delivery
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse { .. } | Self::ConfigValidation { .. } | Self::Destination { .. }
        )
    }
}
