//! LogSink - renders line-protocol records via tracing

use contracts::{ContractError, Destination, ExportBatch, MetricSink, SubmitReport};
use tracing::{info, instrument};

use crate::encoding::line::format_record;
use crate::encoding::LineEncoder;

/// Sink that logs records instead of sending them (dry run)
pub struct LogSink {
    destination: Destination,
}

impl LogSink {
    /// Create a new LogSink for a bound destination
    pub fn new(destination: Destination) -> Self {
        Self { destination }
    }
}

impl MetricSink for LogSink {
    fn name(&self) -> &str {
        &self.destination.alias
    }

    #[instrument(
        name = "log_sink_submit",
        skip(self, batch),
        fields(destination = %self.destination.alias)
    )]
    async fn submit(&mut self, batch: &ExportBatch) -> Result<SubmitReport, ContractError> {
        let (records, skipped) = LineEncoder::new(&self.destination).records(batch);
        let mut bytes = 0;

        for record in &records {
            let line = format_record(record);
            bytes += line.len();
            info!(
                destination = %self.destination.alias,
                path = %record.path,
                value = %record.value,
                timestamp = record.timestamp,
                "Export record"
            );
        }

        Ok(SubmitReport {
            records: records.len(),
            skipped,
            frames: usize::from(!records.is_empty()),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{PerfSample, Protocol, ResultItem};
    use std::time::Duration;

    #[tokio::test]
    async fn test_log_sink_submit() {
        let destination = Destination {
            alias: "dry".into(),
            protocol: Protocol::Log,
            host: "localhost".into(),
            port: 0,
            timeout: Duration::from_secs(1),
            retry: 1,
            path_template: "${check_alias}.${perf_alias}".into(),
            send_perf: true,
            sender_host: "agent".into(),
            payload_length: 1452,
            password: None,
            time_offset: 0,
        };
        let mut sink = LogSink::new(destination);
        assert_eq!(sink.name(), "dry");

        let batch = ExportBatch::new(5, vec![ResultItem::new("c", vec![PerfSample::new("p", 1.5)])]);
        let report = sink.submit(&batch).await.unwrap();
        assert_eq!(report.records, 1);
        assert_eq!(report.bytes, "c.p 1.5 5\n".len());
    }
}
