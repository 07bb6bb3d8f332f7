//! MetricSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for export sinks. Only submission is
//! modelled; a sink has no query or exec capability.

use crate::{ContractError, ExportBatch, SubmitReport};

/// Export sink trait
///
/// One sink serves one bound destination for one dispatch pass.
#[trait_variant::make(MetricSink: Send)]
pub trait LocalMetricSink {
    /// Sink name (destination alias, used for logging/metrics)
    fn name(&self) -> &str;

    /// Encode the batch and deliver it
    ///
    /// # Errors
    /// Returns transport errors; per-record encode errors are absorbed
    /// and only counted in the report.
    async fn submit(&mut self, batch: &ExportBatch) -> Result<SubmitReport, ContractError>;
}
