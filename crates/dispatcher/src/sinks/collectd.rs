//! CollectdSink - binary packets over UDP, fire-and-forget

use contracts::{ContractError, Destination, ExportBatch, MetricSink, SubmitReport};
use tracing::{debug, instrument};

use crate::encoding::{Encoder, PacketEncoder};
use crate::transport::send_datagrams;

/// Sink that sends binary packets to a collectd-compatible collector
pub struct CollectdSink {
    destination: Destination,
}

impl CollectdSink {
    /// Create a new CollectdSink for a bound destination
    pub fn new(destination: Destination) -> Self {
        Self { destination }
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }
}

impl MetricSink for CollectdSink {
    fn name(&self) -> &str {
        &self.destination.alias
    }

    #[instrument(
        name = "collectd_sink_submit",
        skip(self, batch),
        fields(destination = %self.destination.alias, endpoint = %self.destination.endpoint())
    )]
    async fn submit(&mut self, batch: &ExportBatch) -> Result<SubmitReport, ContractError> {
        let encoded = PacketEncoder::new(&self.destination).encode(batch);
        let mut report = SubmitReport {
            records: encoded.records,
            skipped: encoded.skipped,
            ..SubmitReport::default()
        };

        if encoded.is_empty() {
            debug!(skipped = encoded.skipped, "Nothing to send");
            return Ok(report);
        }

        report.bytes = send_datagrams(&self.destination, &encoded.frames).await?;
        report.frames = encoded.frames.len();

        debug!(
            records = report.records,
            packets = report.frames,
            bytes = report.bytes,
            "Packets sent"
        );
        Ok(report)
    }
}
