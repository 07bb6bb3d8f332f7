//! Error types for CLI operations.

use std::path::Path;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Check results could not be read
    #[error("Failed to read check results from {source_name}: {message}")]
    Results {
        source_name: String,
        message: String,
    },

    /// At least one destination reported bad under --strict
    #[error("{failed} of {total} destinations failed")]
    DeliveryFailed { failed: usize, total: usize },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: &Path) -> Self {
        Self::ConfigNotFound {
            path: path.display().to_string(),
        }
    }

    pub fn results(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Results {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn delivery_failed(failed: usize, total: usize) -> Self {
        Self::DeliveryFailed { failed, total }
    }
}

