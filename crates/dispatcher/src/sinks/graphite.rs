//! GraphiteSink - line protocol over TCP

use contracts::{ContractError, Destination, ExportBatch, MetricSink, SubmitReport};
use tracing::{debug, instrument};

use crate::encoding::{Encoder, LineEncoder};
use crate::transport::send_stream;

/// Sink that writes plaintext records to a line-protocol collector
pub struct GraphiteSink {
    destination: Destination,
}

impl GraphiteSink {
    /// Create a new GraphiteSink for a bound destination
    pub fn new(destination: Destination) -> Self {
        Self { destination }
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }
}

impl MetricSink for GraphiteSink {
    fn name(&self) -> &str {
        &self.destination.alias
    }

    #[instrument(
        name = "graphite_sink_submit",
        skip(self, batch),
        fields(destination = %self.destination.alias, endpoint = %self.destination.endpoint())
    )]
    async fn submit(&mut self, batch: &ExportBatch) -> Result<SubmitReport, ContractError> {
        let encoded = LineEncoder::new(&self.destination).encode(batch);
        let mut report = SubmitReport {
            records: encoded.records,
            skipped: encoded.skipped,
            ..SubmitReport::default()
        };

        if encoded.is_empty() {
            debug!(skipped = encoded.skipped, "Nothing to send");
            return Ok(report);
        }

        for frame in &encoded.frames {
            report.bytes += send_stream(&self.destination, frame).await?;
            report.frames += 1;
        }

        debug!(records = report.records, bytes = report.bytes, "Records sent");
        Ok(report)
    }
}
