//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Flatten parent inheritance into the settings consumed by the dispatcher
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use contracts::SettingsProvider;
//! use std::path::Path;
//!
//! let settings = ConfigLoader::load_settings(Path::new("export.toml")).unwrap();
//! println!("Sender: {}", settings.sender_host());
//! ```

mod parser;
mod resolve;
mod validator;

pub use contracts::ExportBlueprint;
pub use parser::ConfigFormat;
pub use resolve::flatten;

use contracts::{ContractError, DestinationSettings, SettingsProvider};
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<ExportBlueprint, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ExportBlueprint, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Load a file straight into a settings provider
    pub fn load_settings(path: &Path) -> Result<ExportSettings, ContractError> {
        Ok(ExportSettings::new(Self::load_from_path(path)?))
    }

    /// Serialize ExportBlueprint to TOML string
    pub fn to_toml(blueprint: &ExportBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize ExportBlueprint to JSON string
    pub fn to_json(blueprint: &ExportBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ExportBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}

/// Settings provider backed by a loaded blueprint
#[derive(Debug, Clone)]
pub struct ExportSettings {
    blueprint: ExportBlueprint,
    sender_host: String,
}

impl ExportSettings {
    /// Wrap a validated blueprint, falling back to the system host name
    pub fn new(blueprint: ExportBlueprint) -> Self {
        let sender_host = blueprint
            .sender
            .host
            .clone()
            .unwrap_or_else(system_hostname);
        Self {
            blueprint,
            sender_host,
        }
    }

    /// Replace the sender host name
    pub fn with_sender_host(mut self, host: impl Into<String>) -> Self {
        self.sender_host = host.into();
        self
    }

    pub fn blueprint(&self) -> &ExportBlueprint {
        &self.blueprint
    }
}

impl SettingsProvider for ExportSettings {
    fn resolve_destinations(&self) -> Result<Vec<DestinationSettings>, ContractError> {
        flatten(&self.blueprint)
    }

    fn sender_host(&self) -> String {
        self.sender_host.clone()
    }
}

fn system_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "localhost".to_string())
}
