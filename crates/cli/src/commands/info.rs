//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{Destination, DestinationOptions};
use dispatcher::Dispatcher;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    sender_host: String,
    destinations: Vec<DestinationInfo>,
}

#[derive(Serialize)]
struct DestinationInfo {
    alias: String,
    protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<ResolvedInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct ResolvedInfo {
    endpoint: String,
    timeout_secs: u64,
    retry: u32,
    path_template: String,
    send_perf: bool,
    payload_length: usize,
    time_offset: i64,
    password_set: bool,
}

impl From<&Destination> for ResolvedInfo {
    fn from(destination: &Destination) -> Self {
        Self {
            endpoint: destination.endpoint(),
            timeout_secs: destination.timeout.as_secs(),
            retry: destination.retry,
            path_template: destination.path_template.clone(),
            send_perf: destination.send_perf,
            payload_length: destination.payload_length,
            time_offset: destination.time_offset,
            password_set: destination.password.is_some(),
        }
    }
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    let settings = config_loader::ConfigLoader::load_settings(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    let dispatcher = Dispatcher::from_provider(&settings, DestinationOptions::new())
        .context("Failed to resolve destinations")?;

    let info = build_config_info(settings.blueprint(), &dispatcher);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(blueprint: &contracts::ExportBlueprint, dispatcher: &Dispatcher) -> ConfigInfo {
    let destinations = blueprint
        .destinations
        .iter()
        .zip(dispatcher.bind_all())
        .map(|(settings, (alias, bound))| {
            let (resolved, error) = match bound {
                Ok(destination) => (Some(ResolvedInfo::from(&destination)), None),
                Err(e) => (None, Some(e.to_string())),
            };
            DestinationInfo {
                alias,
                protocol: settings.protocol.to_string(),
                parent: settings.parent.clone(),
                resolved,
                error,
            }
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        sender_host: dispatcher.config().sender_host.clone(),
        destinations,
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              Metric Forwarder Configuration                  ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📍 Sender");
    println!("   ├─ Version: {}", info.version);
    println!("   └─ Host: {}", info.sender_host);

    println!("\n📤 Destinations ({})", info.destinations.len());
    for (i, destination) in info.destinations.iter().enumerate() {
        let is_last = i == info.destinations.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        match &destination.parent {
            Some(parent) => println!(
                "   {} {} ({}, inherits {})",
                prefix, destination.alias, destination.protocol, parent
            ),
            None => println!("   {} {} ({})", prefix, destination.alias, destination.protocol),
        }

        match (&destination.resolved, &destination.error) {
            (Some(resolved), _) => {
                println!("   {}  ├─ Endpoint: {}", child_prefix, resolved.endpoint);
                println!(
                    "   {}  ├─ Timeout: {}s, retry {}",
                    child_prefix, resolved.timeout_secs, resolved.retry
                );
                println!("   {}  ├─ Path: {}", child_prefix, resolved.path_template);
                println!(
                    "   {}  ├─ Payload length: {}",
                    child_prefix, resolved.payload_length
                );
                println!(
                    "   {}  └─ Send perfdata: {}, time offset {}s",
                    child_prefix, resolved.send_perf, resolved.time_offset
                );
            }
            (None, Some(error)) => println!("   {}  └─ ⚠ {}", child_prefix, error),
            (None, None) => {}
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader, ExportSettings};

    #[test]
    fn test_build_config_info() {
        let blueprint = ConfigLoader::load_from_str(
            r#"
[sender]
host = "agent"

[[destinations]]
alias = "carbon"
protocol = "graphite"
[destinations.options]
host = "carbon.example.net"
password = "secret"

[[destinations]]
alias = "mirror"
protocol = "graphite"
parent = "carbon"
[destinations.options]
port = 2103

[[destinations]]
alias = "hostless"
protocol = "graphite"
"#,
            ConfigFormat::Toml,
        )
        .unwrap();
        let settings = ExportSettings::new(blueprint);
        let dispatcher = Dispatcher::from_provider(&settings, DestinationOptions::new()).unwrap();

        let info = build_config_info(settings.blueprint(), &dispatcher);
        assert_eq!(info.sender_host, "agent");
        assert_eq!(info.destinations.len(), 3);

        let carbon = info.destinations[0].resolved.as_ref().unwrap();
        assert_eq!(carbon.endpoint, "carbon.example.net:2003");
        assert!(carbon.password_set);

        let mirror = &info.destinations[1];
        assert_eq!(mirror.parent.as_deref(), Some("carbon"));
        assert_eq!(
            mirror.resolved.as_ref().unwrap().endpoint,
            "carbon.example.net:2103"
        );

        let hostless = &info.destinations[2];
        assert!(hostless.resolved.is_none());
        assert!(hostless.error.is_some());

        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains("secret"));
    }
}
