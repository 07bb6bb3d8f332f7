//! Dispatcher - fans one batch out to every configured destination
//!
//! Each destination is bound, encoded and delivered on its own task. The
//! response always carries one result per destination, in configuration
//! order. `good` means the bytes were accepted by the local transport; for
//! the datagram protocol that is not proof the collector received them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use contracts::{
    ContractError, Destination, DestinationOptions, DestinationSettings, ExportBatch,
    ExportResult, MetricSink, Protocol, ResultItem, SettingsProvider, SubmitReport,
    SubmitResponse,
};

use crate::destination::bind_destination;
use crate::error::DispatcherError;
use crate::metrics::{DispatchMetrics, MetricsSnapshot};
use crate::sinks::{CollectdSink, GraphiteSink, LogSink};

/// Dispatcher configuration
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    /// Destinations in configuration order
    pub destinations: Vec<DestinationSettings>,
    /// This agent's host name, used for `${hostname}` and the HOST part
    pub sender_host: String,
    /// Invocation-level options applied on top of every destination
    pub overrides: DestinationOptions,
}

/// The main Dispatcher that fans out batches to destinations
#[derive(Debug)]
pub struct Dispatcher {
    config: Arc<DispatcherConfig>,
    metrics: Arc<DispatchMetrics>,
}

impl Dispatcher {
    /// Create a new dispatcher
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            config: Arc::new(config),
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }

    /// Create a dispatcher from the settings collaborator
    #[instrument(name = "dispatcher_from_provider", skip_all)]
    pub fn from_provider(
        provider: &impl SettingsProvider,
        overrides: DestinationOptions,
    ) -> Result<Self, DispatcherError> {
        let destinations = provider.resolve_destinations()?;
        debug!(destinations = destinations.len(), "Destinations resolved");

        Ok(Self::new(DispatcherConfig {
            destinations,
            sender_host: provider.sender_host(),
            overrides,
        }))
    }

    /// Restrict to the named destinations, keeping configuration order
    ///
    /// An empty selection keeps every destination. Metrics stay shared with
    /// the original dispatcher.
    pub fn select<S: AsRef<str>>(&self, aliases: &[S]) -> Result<Self, DispatcherError> {
        if aliases.is_empty() {
            return Ok(Self {
                config: Arc::clone(&self.config),
                metrics: Arc::clone(&self.metrics),
            });
        }

        for alias in aliases {
            let alias = alias.as_ref();
            if !self.config.destinations.iter().any(|d| d.alias == alias) {
                return Err(DispatcherError::unknown_destination(alias));
            }
        }

        let destinations = self
            .config
            .destinations
            .iter()
            .filter(|d| aliases.iter().any(|a| a.as_ref() == d.alias))
            .cloned()
            .collect();

        Ok(Self {
            config: Arc::new(DispatcherConfig {
                destinations,
                sender_host: self.config.sender_host.clone(),
                overrides: self.config.overrides.clone(),
            }),
            metrics: Arc::clone(&self.metrics),
        })
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Destinations this dispatcher delivers to
    pub fn destinations(&self) -> &[DestinationSettings] {
        &self.config.destinations
    }

    /// Bind every destination without delivering anything
    pub fn bind_all(&self) -> Vec<(String, Result<Destination, ContractError>)> {
        self.config
            .destinations
            .iter()
            .map(|settings| {
                let bound =
                    bind_destination(settings, &self.config.sender_host, &self.config.overrides);
                (settings.alias.clone(), bound)
            })
            .collect()
    }

    /// Get dispatch metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Submit check results stamped with the current time
    pub async fn submit(&self, items: Vec<ResultItem>) -> SubmitResponse {
        let timestamp = chrono::Utc::now().timestamp();
        self.submit_batch(Arc::new(ExportBatch::new(timestamp, items)))
            .await
    }

    /// Submit a batch to every destination
    ///
    /// Never fails: configuration and delivery errors are carried in the
    /// per-destination results.
    #[instrument(
        name = "dispatcher_submit",
        skip(self, batch),
        fields(
            destinations = self.config.destinations.len(),
            items = batch.items.len(),
            timestamp = batch.timestamp
        )
    )]
    pub async fn submit_batch(&self, batch: Arc<ExportBatch>) -> SubmitResponse {
        self.metrics.inc_submissions();
        observability::record_batch(batch.items.len(), batch.sample_count());

        let destinations = &self.config.destinations;
        let mut tasks = JoinSet::new();
        let mut slots = HashMap::with_capacity(destinations.len());

        for (index, settings) in destinations.iter().enumerate() {
            let config = Arc::clone(&self.config);
            let metrics = Arc::clone(&self.metrics);
            let batch = Arc::clone(&batch);

            let handle = tasks.spawn(async move {
                let settings = &config.destinations[index];
                export_to(settings, &config, &batch, &metrics).await
            });
            slots.insert(handle.id(), index);
            debug!(destination = %settings.alias, index, "Destination task spawned");
        }

        let mut results: Vec<Option<ExportResult>> = vec![None; destinations.len()];
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, result)) => {
                    if let Some(&index) = slots.get(&id) {
                        results[index] = Some(result);
                    }
                }
                Err(e) => {
                    if let Some(&index) = slots.get(&e.id()) {
                        let settings = &destinations[index];
                        warn!(destination = %settings.alias, error = %e, "Destination task failed");
                        results[index] = Some(ExportResult::bad(
                            &settings.alias,
                            settings.protocol,
                            format!("Error: destination task failed: {e}"),
                        ));
                    }
                }
            }
        }

        let mut response = SubmitResponse::default();
        for (slot, settings) in results.into_iter().zip(destinations) {
            let result = slot.unwrap_or_else(|| {
                ExportResult::bad(
                    &settings.alias,
                    settings.protocol,
                    "Error: destination produced no result",
                )
            });

            if result.is_good() {
                self.metrics.inc_delivered();
            } else {
                self.metrics.inc_failed();
            }
            response.push(result);
        }

        info!(
            destinations = response.results.len(),
            failed = response.failed().count(),
            "Submission complete"
        );
        response
    }
}

/// Bind, encode and deliver one destination
#[instrument(
    name = "dispatcher_export_to",
    skip_all,
    fields(destination = %settings.alias, protocol = %settings.protocol)
)]
async fn export_to(
    settings: &DestinationSettings,
    config: &DispatcherConfig,
    batch: &ExportBatch,
    metrics: &DispatchMetrics,
) -> ExportResult {
    let started = Instant::now();

    let outcome = match bind_destination(settings, &config.sender_host, &config.overrides) {
        Ok(destination) => run_sink(destination, batch).await,
        Err(e) => Err(e),
    };

    let result = match outcome {
        Ok(report) => {
            metrics.record_report(&report);
            observability::record_submit_report(&settings.alias, &report);
            ExportResult::good(&settings.alias, settings.protocol, report.records)
        }
        Err(e) => {
            warn!(error = %e, "Export failed");
            ExportResult::bad(&settings.alias, settings.protocol, failure_message(&e))
        }
    };

    observability::record_export_result(&result, started.elapsed());
    result
}

/// Pick the sink for a protocol and submit
async fn run_sink(
    destination: Destination,
    batch: &ExportBatch,
) -> Result<SubmitReport, ContractError> {
    match destination.protocol {
        Protocol::Graphite => deliver(GraphiteSink::new(destination), batch).await,
        Protocol::Collectd => deliver(CollectdSink::new(destination), batch).await,
        Protocol::Log => deliver(LogSink::new(destination), batch).await,
    }
}

async fn deliver<S: MetricSink>(
    mut sink: S,
    batch: &ExportBatch,
) -> Result<SubmitReport, ContractError> {
    sink.submit(batch).await
}

/// Render an error into the caller-facing result message
fn failure_message(err: &ContractError) -> String {
    if err.is_config() {
        format!("Configuration error: {err}")
    } else if err.transport_failure().is_some() || matches!(err, ContractError::Io(_)) {
        format!("Socket error: {err}")
    } else {
        format!("Error: {err}")
    }
}

/// Convenience function to create a dispatcher from destination settings
#[instrument(name = "dispatcher_create", skip(destinations, sender_host))]
pub fn create_dispatcher(
    destinations: Vec<DestinationSettings>,
    sender_host: impl Into<String>,
) -> Dispatcher {
    Dispatcher::new(DispatcherConfig {
        destinations,
        sender_host: sender_host.into(),
        overrides: DestinationOptions::new(),
    })
}
