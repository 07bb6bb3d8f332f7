//! Check results - input of the export path
//!
//! Produced by the agent's check pipeline, read-only here.

use serde::{Deserialize, Serialize};

/// Result of one executed check
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    /// Check alias (e.g. "check_cpu")
    pub check_alias: String,

    /// Result lines, each with its own performance data
    #[serde(default)]
    pub lines: Vec<ResultLine>,
}

impl ResultItem {
    /// Create a result with a single line carrying the given samples
    pub fn new(check_alias: impl Into<String>, perf: Vec<PerfSample>) -> Self {
        Self {
            check_alias: check_alias.into(),
            lines: vec![ResultLine {
                message: String::new(),
                perf,
            }],
        }
    }

    /// Iterate every performance sample of every line
    pub fn samples(&self) -> impl Iterator<Item = &PerfSample> {
        self.lines.iter().flat_map(|l| l.perf.iter())
    }
}

/// One line of check output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultLine {
    /// Human readable message
    #[serde(default)]
    pub message: String,

    /// Attached performance samples
    #[serde(default)]
    pub perf: Vec<PerfSample>,
}

/// Performance-data sample
///
/// Only `alias` and `value` are exported; unit and thresholds ride along.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfSample {
    pub alias: String,

    pub value: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

impl PerfSample {
    /// Sample without unit or thresholds
    pub fn new(alias: impl Into<String>, value: f64) -> Self {
        Self {
            alias: alias.into(),
            value,
            unit: None,
            warning: None,
            critical: None,
            minimum: None,
            maximum: None,
        }
    }

    /// Attach a unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}
