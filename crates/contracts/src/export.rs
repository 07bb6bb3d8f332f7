//! Export records and per-destination outcomes

use serde::{Deserialize, Serialize};

use crate::{Protocol, ResultItem};

/// Message reported for a successful hand-off to the local transport
///
/// For datagram destinations this cannot confirm receipt by the collector.
pub const DELIVERED_MESSAGE: &str = "Data presumably sent successfully";

/// One dispatch pass worth of check results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportBatch {
    /// Seconds since the Unix epoch, shared by every record of the pass
    pub timestamp: i64,

    /// Check results to export
    pub items: Vec<ResultItem>,
}

impl ExportBatch {
    pub fn new(timestamp: i64, items: Vec<ResultItem>) -> Self {
        Self { timestamp, items }
    }

    /// Total number of performance samples in the batch
    pub fn sample_count(&self) -> usize {
        self.items.iter().map(|i| i.samples().count()).sum()
    }
}

/// Flattened unit handed to an encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRecord {
    /// Templated and sanitised path
    pub path: String,
    /// Rendered sample value
    pub value: String,
    /// Seconds since the Unix epoch
    pub timestamp: i64,
}

/// What a sink did with a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitReport {
    /// Records written
    pub records: usize,
    /// Samples dropped by the encoder
    pub skipped: usize,
    /// Frames handed to the transport (stream writes or datagrams)
    pub frames: usize,
    /// Bytes handed to the transport
    pub bytes: usize,
}

/// Pass/fail status of one destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    Good,
    Bad,
}

impl ExportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Bad => "bad",
        }
    }
}

impl std::fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome for one destination of one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportResult {
    pub destination: String,
    pub protocol: Protocol,
    pub status: ExportStatus,
    pub message: String,
    /// Records handed to the transport
    pub records: usize,
}

impl ExportResult {
    /// Successful delivery
    pub fn good(destination: impl Into<String>, protocol: Protocol, records: usize) -> Self {
        Self {
            destination: destination.into(),
            protocol,
            status: ExportStatus::Good,
            message: DELIVERED_MESSAGE.to_string(),
            records,
        }
    }

    /// Failed delivery or configuration
    pub fn bad(
        destination: impl Into<String>,
        protocol: Protocol,
        message: impl Into<String>,
    ) -> Self {
        Self {
            destination: destination.into(),
            protocol,
            status: ExportStatus::Bad,
            message: message.into(),
            records: 0,
        }
    }

    pub fn is_good(&self) -> bool {
        self.status == ExportStatus::Good
    }
}

/// Response envelope: one result per configured destination, in configuration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub results: Vec<ExportResult>,
}

impl SubmitResponse {
    pub fn push(&mut self, result: ExportResult) {
        self.results.push(result);
    }

    /// True when every destination reported good (vacuously true when empty)
    pub fn all_good(&self) -> bool {
        self.results.iter().all(ExportResult::is_good)
    }

    /// Results with bad status
    pub fn failed(&self) -> impl Iterator<Item = &ExportResult> {
        self.results.iter().filter(|r| !r.is_good())
    }

    /// Result for a destination alias
    pub fn get(&self, destination: &str) -> Option<&ExportResult> {
        self.results.iter().find(|r| r.destination == destination)
    }
}
