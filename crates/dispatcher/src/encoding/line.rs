//! Line protocol encoder
//!
//! Wire form of one record: `<path> <value> <epoch_seconds>\n`.

use bytes::Bytes;
use contracts::{ContractError, Destination, ExportBatch, ExportRecord};
use tracing::debug;

use super::{Encoded, Encoder};
use crate::template::{render_path, PathContext};

/// Encoder for the plaintext line protocol
pub struct LineEncoder<'a> {
    destination: &'a Destination,
}

impl<'a> LineEncoder<'a> {
    pub fn new(destination: &'a Destination) -> Self {
        Self { destination }
    }

    /// Flatten a batch into records
    ///
    /// Returns the records and the number of skipped samples. No records
    /// are produced when the destination does not send perf data.
    pub fn records(&self, batch: &ExportBatch) -> (Vec<ExportRecord>, usize) {
        let dest = self.destination;
        if !dest.send_perf {
            return (Vec::new(), 0);
        }

        let timestamp = batch.timestamp.saturating_add(dest.time_offset);
        let mut records = Vec::with_capacity(batch.sample_count());
        let mut skipped = 0;

        for item in &batch.items {
            for sample in item.samples() {
                let ctx = PathContext::new(&dest.sender_host, &item.check_alias, &sample.alias);
                let path = render_path(&dest.path_template, &ctx);

                match render_value(&path, sample.value) {
                    Ok(value) => records.push(ExportRecord {
                        path,
                        value,
                        timestamp,
                    }),
                    Err(e) => {
                        skipped += 1;
                        debug!(destination = %dest.alias, error = %e, "Skipping sample");
                    }
                }
            }
        }

        (records, skipped)
    }
}

impl Encoder for LineEncoder<'_> {
    fn encode(&self, batch: &ExportBatch) -> Encoded {
        let (records, skipped) = self.records(batch);
        if records.is_empty() {
            return Encoded {
                frames: Vec::new(),
                records: 0,
                skipped,
            };
        }

        let mut payload = String::with_capacity(records.len() * 48);
        for record in &records {
            payload.push_str(&format_record(record));
        }

        Encoded {
            frames: vec![Bytes::from(payload)],
            records: records.len(),
            skipped,
        }
    }
}

/// Render a sample value as plain text
pub fn render_value(path: &str, value: f64) -> Result<String, ContractError> {
    if value.is_finite() {
        Ok(value.to_string())
    } else {
        Err(ContractError::encode(
            path,
            format!("value {value} is not finite"),
        ))
    }
}

/// One wire line, newline terminated
pub fn format_record(record: &ExportRecord) -> String {
    format!("{} {} {}\n", record.path, record.value, record.timestamp)
}

/// Parse one wire line back into a record
///
/// Grammar: `path SP value SP epoch [LF]`, path and value free of spaces.
pub fn parse_line(line: &str) -> Result<ExportRecord, ContractError> {
    let trimmed = line.strip_suffix('\n').unwrap_or(line);
    let mut fields = trimmed.split(' ');

    let (Some(path), Some(value), Some(epoch), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(ContractError::Other(format!(
            "expected 3 space separated fields in '{trimmed}'"
        )));
    };

    if path.is_empty() {
        return Err(ContractError::Other("empty metric path".to_string()));
    }
    value
        .parse::<f64>()
        .map_err(|e| ContractError::Other(format!("invalid value '{value}': {e}")))?;
    let timestamp = epoch
        .parse::<i64>()
        .map_err(|e| ContractError::Other(format!("invalid timestamp '{epoch}': {e}")))?;

    Ok(ExportRecord {
        path: path.to_string(),
        value: value.to_string(),
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{PerfSample, Protocol, ResultItem, ResultLine};
    use std::time::Duration;

    fn destination(template: &str, send_perf: bool) -> Destination {
        Destination {
            alias: "graphite".into(),
            protocol: Protocol::Graphite,
            host: "127.0.0.1".into(),
            port: 2003,
            timeout: Duration::from_secs(1),
            retry: 1,
            path_template: template.into(),
            send_perf,
            sender_host: "web 01".into(),
            payload_length: 1452,
            password: None,
            time_offset: 0,
        }
    }

    fn batch() -> ExportBatch {
        ExportBatch::new(
            1_700_000_000,
            vec![
                ResultItem::new("cpu", vec![PerfSample::new("load", 4.5)]),
                ResultItem {
                    check_alias: "disk check".into(),
                    lines: vec![
                        ResultLine {
                            message: "C".into(),
                            perf: vec![PerfSample::new("used%", 80.0)],
                        },
                        ResultLine {
                            message: "D".into(),
                            perf: vec![PerfSample::new("free", -0.25)],
                        },
                    ],
                },
            ],
        )
    }

    #[test]
    fn test_encode_wire_format() {
        let dest = destination("${hostname}.${check_alias}.${perf_alias}", true);
        let encoded = LineEncoder::new(&dest).encode(&batch());

        assert_eq!(encoded.records, 3);
        assert_eq!(encoded.frames.len(), 1);
        assert_eq!(
            std::str::from_utf8(&encoded.frames[0]).unwrap(),
            "web_01.cpu.load 4.5 1700000000\n\
             web_01.disk_check.used% 80 1700000000\n\
             web_01.disk_check.free -0.25 1700000000\n"
        );
    }

    #[test]
    fn test_send_perf_disabled_produces_nothing() {
        let dest = destination("${perf_alias}", false);
        let encoded = LineEncoder::new(&dest).encode(&batch());
        assert!(encoded.is_empty());
        assert_eq!(encoded.records, 0);
        assert_eq!(encoded.skipped, 0);
    }

    #[test]
    fn test_non_finite_values_skipped() {
        let dest = destination("${perf_alias}", true);
        let batch = ExportBatch::new(
            10,
            vec![ResultItem::new(
                "c",
                vec![
                    PerfSample::new("nan", f64::NAN),
                    PerfSample::new("ok", 1.0),
                    PerfSample::new("inf", f64::INFINITY),
                ],
            )],
        );
        let encoded = LineEncoder::new(&dest).encode(&batch);
        assert_eq!(encoded.records, 1);
        assert_eq!(encoded.skipped, 2);
        assert_eq!(&encoded.frames[0][..], b"ok 1 10\n");
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let dest = destination("${hostname}.${check_alias}.${perf_alias}", true);
        let encoder = LineEncoder::new(&dest);
        assert_eq!(encoder.encode(&batch()), encoder.encode(&batch()));
    }

    #[test]
    fn test_time_offset_applied_uniformly() {
        let mut dest = destination("${perf_alias}", true);
        dest.time_offset = -100;
        let (records, _) = LineEncoder::new(&dest).records(&batch());
        assert!(records.iter().all(|r| r.timestamp == 1_699_999_900));
    }

    #[test]
    fn test_extreme_time_offset_saturates() {
        let mut dest = destination("${perf_alias}", true);
        dest.time_offset = i64::MAX;
        let (records, _) = LineEncoder::new(&dest).records(&batch());
        assert!(records.iter().all(|r| r.timestamp == i64::MAX));

        dest.time_offset = i64::MIN;
        let (records, _) = LineEncoder::new(&dest).records(&batch());
        assert!(records.iter().all(|r| r.timestamp == i64::MIN + 1_700_000_000));
    }

    #[test]
    fn test_parse_line() {
        let record = parse_line("cpu.load 4.5 1700000000\n").unwrap();
        assert_eq!(record.path, "cpu.load");
        assert_eq!(record.value, "4.5");
        assert_eq!(record.timestamp, 1_700_000_000);

        assert!(parse_line("cpu.load 4.5").is_err());
        assert!(parse_line("cpu.load four 1700000000").is_err());
        assert!(parse_line("a b c d").is_err());
    }

    #[test]
    fn test_encoded_lines_parse_back() {
        let dest = destination("${check_alias}.${perf_alias}", true);
        let encoded = LineEncoder::new(&dest).encode(&batch());
        let text = std::str::from_utf8(&encoded.frames[0]).unwrap();
        let parsed: Vec<_> = text
            .split_inclusive('\n')
            .map(|l| parse_line(l).unwrap())
            .collect();
        let (records, _) = LineEncoder::new(&dest).records(&batch());
        assert_eq!(parsed, records);
    }
}
