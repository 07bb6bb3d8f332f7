//! `submit` command implementation.

use std::io::Read;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{keys, DestinationOptions, ResultItem, SubmitResponse};
use dispatcher::Dispatcher;
use observability::ExportMetricsAggregator;
use serde::Deserialize;
use tracing::{info, warn};

use crate::cli::{OverrideArgs, SubmitArgs};
use crate::error::CliError;

/// Accepted shapes of the results file
#[derive(Deserialize)]
#[serde(untagged)]
enum ResultsDocument {
    Items(Vec<ResultItem>),
    Envelope { results: Vec<ResultItem> },
}

/// Execute the `submit` command
pub async fn run_submit(args: &SubmitArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    let mut settings = config_loader::ConfigLoader::load_settings(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    if let Some(ref host) = args.sender_host {
        info!(sender_host = %host, "Overriding sender host from CLI");
        settings = settings.with_sender_host(host);
    }

    let items = read_results(&args.results)?;
    info!(
        items = items.len(),
        samples = items.iter().map(|i| i.samples().count()).sum::<usize>(),
        "Check results loaded"
    );

    let overrides = build_overrides(&args.overrides);
    let dispatcher = Dispatcher::from_provider(&settings, overrides)
        .context("Failed to resolve destinations")?
        .select(&args.destinations)?;

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let mut aggregator = ExportMetricsAggregator::new();
    let mut pass: u64 = 0;

    let last = loop {
        pass += 1;
        let started = Instant::now();
        let response = dispatcher.submit(items.clone()).await;
        let elapsed = started.elapsed();

        for result in &response.results {
            aggregator.update(result, elapsed);
        }
        print_response(&response, args.json)?;

        if args.repeat != 0 && pass >= args.repeat {
            break response;
        }

        let interrupted = tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(args.interval)) => false,
            _ = shutdown_signal() => true,
        };
        if interrupted {
            warn!("Received shutdown signal, stopping");
            break response;
        }
    };

    if pass > 1 {
        let snapshot = dispatcher.metrics();
        info!(
            passes = pass,
            delivered = snapshot.delivered,
            failed = snapshot.failed,
            records_sent = snapshot.records_sent,
            "Submission loop finished"
        );
        if !args.json {
            print!("{}", aggregator.summary());
        }
    }

    let failed = last.failed().count();
    if args.strict && failed > 0 {
        return Err(CliError::delivery_failed(failed, last.results.len()).into());
    }

    Ok(())
}

/// Map CLI overrides onto destination options
///
/// `--buffer-length` is applied first so `--payload-length` wins when both are given.
fn build_overrides(args: &OverrideArgs) -> DestinationOptions {
    let mut options = DestinationOptions::new();

    if let Some(ref host) = args.host {
        options.set(keys::HOST, host.as_str());
    }
    if let Some(port) = args.port {
        options.set(keys::PORT, i64::from(port));
    }
    if let Some(timeout) = args.timeout {
        options.set(keys::TIMEOUT, i64::try_from(timeout).unwrap_or(i64::MAX));
    }
    if let Some(retry) = args.retry {
        options.set(keys::RETRY, i64::from(retry));
    }
    if let Some(ref path) = args.perf_path {
        options.set(keys::PERF_PATH, path.as_str());
    }
    if let Some(send) = args.send_perfdata {
        options.set(keys::SEND_PERFDATA, send);
    }
    if let Some(length) = args.buffer_length {
        options.set(keys::BUFFER_LENGTH, i64::from(length));
    }
    if let Some(length) = args.payload_length {
        options.set(keys::PAYLOAD_LENGTH, i64::from(length));
    }
    if let Some(ref password) = args.password {
        options.set(keys::PASSWORD, password.as_str());
    }
    if let Some(offset) = args.time_offset {
        options.set(keys::TIME_OFFSET, offset);
    }

    options
}

/// Read check results from a file or standard input
fn read_results(path: &Path) -> Result<Vec<ResultItem>, CliError> {
    let (source_name, content) = if path == Path::new("-") {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        ("stdin".to_string(), content)
    } else {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CliError::results(path.display().to_string(), e.to_string()))?;
        (path.display().to_string(), content)
    };

    parse_results(&content).map_err(|e| CliError::results(source_name, e.to_string()))
}

fn parse_results(content: &str) -> Result<Vec<ResultItem>, serde_json::Error> {
    let document: ResultsDocument = serde_json::from_str(content)?;
    Ok(match document {
        ResultsDocument::Items(items) => items,
        ResultsDocument::Envelope { results } => results,
    })
}

fn print_response(response: &SubmitResponse, json: bool) -> Result<()> {
    if json {
        let json =
            serde_json::to_string_pretty(response).context("Failed to serialize response")?;
        println!("{}", json);
        return Ok(());
    }

    for result in &response.results {
        if result.is_good() {
            println!(
                "✓ {} ({}): {} ({} records)",
                result.destination, result.protocol, result.message, result.records
            );
        } else {
            println!(
                "✗ {} ({}): {}",
                result.destination, result.protocol, result.message
            );
        }
    }
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never resolves.
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::OptionValue;

    #[test]
    fn test_build_overrides() {
        let args = OverrideArgs {
            host: Some("carbon:2103".into()),
            retry: Some(5),
            send_perfdata: Some(false),
            buffer_length: Some(512),
            payload_length: Some(1024),
            time_offset: Some(-60),
            ..Default::default()
        };

        let options = build_overrides(&args);
        assert_eq!(options.get_text(keys::HOST).as_deref(), Some("carbon:2103"));
        assert_eq!(options.get(keys::RETRY), Some(&OptionValue::Int(5)));
        assert_eq!(options.get(keys::SEND_PERFDATA), Some(&OptionValue::Bool(false)));
        assert_eq!(options.get(keys::PAYLOAD_LENGTH), Some(&OptionValue::Int(1024)));
        assert_eq!(options.get(keys::TIME_OFFSET), Some(&OptionValue::Int(-60)));
        assert!(!options.contains(keys::PORT));
    }

    #[test]
    fn test_empty_overrides() {
        assert!(build_overrides(&OverrideArgs::default()).is_empty());
    }

    #[test]
    fn test_parse_results_shapes() {
        let bare = r#"[{"check_alias": "cpu", "lines": [{"perf": [{"alias": "load", "value": 0.5}]}]}]"#;
        let items = parse_results(bare).unwrap();
        assert_eq!(items[0].check_alias, "cpu");
        assert_eq!(items[0].samples().count(), 1);

        let envelope = r#"{"results": [{"check_alias": "disk"}]}"#;
        let items = parse_results(envelope).unwrap();
        assert_eq!(items[0].check_alias, "disk");
        assert!(items[0].lines.is_empty());

        assert!(parse_results("{").is_err());
    }

    #[test]
    fn test_read_results_missing_file() {
        let err = read_results(Path::new("/nonexistent/results.json")).unwrap_err();
        assert!(matches!(err, CliError::Results { .. }));
    }
}
