//! SettingsProvider - destination settings collaborator

use crate::{ContractError, DestinationSettings};

/// Source of resolved, flattened destination settings
///
/// The settings storage itself lives outside the export path; only its
/// resolved output is consumed.
pub trait SettingsProvider {
    /// Destinations configured for the export module, in configuration order
    fn resolve_destinations(&self) -> Result<Vec<DestinationSettings>, ContractError>;

    /// This agent's own host name
    fn sender_host(&self) -> String;
}
