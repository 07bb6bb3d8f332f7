//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{ExportBlueprint, SettingsProvider};
use dispatcher::bind_destination;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    sender_host: String,
    destination_count: usize,
    graphite_count: usize,
    collectd_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    let settings = match config_loader::ConfigLoader::load_settings(&args.config) {
        Ok(settings) => settings,
        Err(e) => {
            return ValidationResult {
                valid: false,
                config_path,
                error: Some(e.to_string()),
                warnings: None,
                summary: None,
            }
        }
    };

    let warnings = match collect_warnings(&settings) {
        Ok(warnings) => warnings,
        Err(e) => {
            return ValidationResult {
                valid: false,
                config_path,
                error: Some(e.to_string()),
                warnings: None,
                summary: None,
            }
        }
    };

    let blueprint = settings.blueprint();
    ValidationResult {
        valid: true,
        config_path,
        error: None,
        warnings: if warnings.is_empty() {
            None
        } else {
            Some(warnings)
        },
        summary: Some(summarize(blueprint, settings.sender_host())),
    }
}

fn summarize(blueprint: &ExportBlueprint, sender_host: String) -> ConfigSummary {
    let count = |protocol: contracts::Protocol| {
        blueprint
            .destinations
            .iter()
            .filter(|d| d.protocol == protocol)
            .count()
    };

    ConfigSummary {
        version: format!("{:?}", blueprint.version),
        sender_host,
        destination_count: blueprint.destinations.len(),
        graphite_count: count(contracts::Protocol::Graphite),
        collectd_count: count(contracts::Protocol::Collectd),
    }
}

/// Collect configuration warnings (non-fatal issues)
///
/// A destination that will not bind is a warning here: it still gets its
/// own bad result at submit time.
fn collect_warnings(
    settings: &config_loader::ExportSettings,
) -> Result<Vec<String>, contracts::ContractError> {
    let mut warnings = Vec::new();
    let sender_host = settings.sender_host();
    let destinations = settings.resolve_destinations()?;

    if destinations.is_empty() {
        warnings.push("No destinations configured - results will not be exported".to_string());
    }

    for destination in &destinations {
        let unknown = destination.options.unknown_keys();
        if !unknown.is_empty() {
            warnings.push(format!(
                "Destination '{}' has unknown options: {}",
                destination.alias,
                unknown.join(", ")
            ));
        }

        if let Err(e) =
            bind_destination(destination, &sender_host, &contracts::DestinationOptions::new())
        {
            warnings.push(e.to_string());
        }
    }

    Ok(warnings)
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Sender host: {}", summary.sender_host);
            println!("  Destinations: {}", summary.destination_count);
            println!("  Line protocol: {}", summary.graphite_count);
            println!("  Packet protocol: {}", summary.collectd_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
