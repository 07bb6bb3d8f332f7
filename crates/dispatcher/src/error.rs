//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
///
/// Only raised while setting a dispatcher up; a running submission never
/// fails as a whole.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Settings collaborator could not resolve destinations
    #[error("failed to resolve destinations: {0}")]
    Settings(#[from] contracts::ContractError),

    /// A selected alias is not configured
    #[error("destination '{alias}' is not configured")]
    UnknownDestination { alias: String },
}

impl DispatcherError {
    /// Create an unknown destination error
    pub fn unknown_destination(alias: impl Into<String>) -> Self {
        Self::UnknownDestination {
            alias: alias.into(),
        }
    }
}
