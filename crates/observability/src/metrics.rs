//! 导出指标收集模块
//!
//! 基于 ExportResult 收集和统计每个目的地的投递指标。

use std::collections::HashMap;
use std::time::Duration;

use contracts::{ExportResult, ExportStatus, SubmitReport};
use metrics::{counter, gauge, histogram};

/// 从 ExportResult 记录指标
///
/// 每个目的地完成一次投递后调用。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_export_result;
///
/// for result in &response.results {
///     record_export_result(result, elapsed);
/// }
/// ```
pub fn record_export_result(result: &ExportResult, elapsed: Duration) {
    let status = result.status.as_str();

    counter!(
        "metric_forwarder_exports_total",
        "destination" => result.destination.clone(),
        "protocol" => result.protocol.as_str(),
        "status" => status
    )
    .increment(1);

    histogram!(
        "metric_forwarder_delivery_latency_ms",
        "destination" => result.destination.clone()
    )
    .record(elapsed.as_secs_f64() * 1000.0);

    if result.status == ExportStatus::Bad {
        counter!(
            "metric_forwarder_delivery_failures_total",
            "destination" => result.destination.clone()
        )
        .increment(1);
    }
}

/// 记录发送的记录数和跳过的样本数
pub fn record_submit_report(destination: &str, report: &SubmitReport) {
    counter!(
        "metric_forwarder_records_sent_total",
        "destination" => destination.to_string()
    )
    .increment(report.records as u64);

    counter!(
        "metric_forwarder_bytes_sent_total",
        "destination" => destination.to_string()
    )
    .increment(report.bytes as u64);

    if report.skipped > 0 {
        counter!(
            "metric_forwarder_samples_skipped_total",
            "destination" => destination.to_string()
        )
        .increment(report.skipped as u64);
    }
}

/// 记录一次提交的批次大小
pub fn record_batch(items: usize, samples: usize) {
    counter!("metric_forwarder_submissions_total").increment(1);
    gauge!("metric_forwarder_last_batch_items").set(items as f64);
    histogram!("metric_forwarder_batch_samples").record(samples as f64);
}

/// 导出指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct ExportMetricsAggregator {
    /// 总投递次数
    pub total_exports: u64,

    /// 失败次数
    pub total_failures: u64,

    /// 投递延迟统计 (毫秒)
    pub latency_stats: RunningStats,

    /// 各目的地失败次数
    pub failure_counts: HashMap<String, u64>,
}

impl ExportMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, result: &ExportResult, elapsed: Duration) {
        self.total_exports += 1;
        self.latency_stats.push(elapsed.as_secs_f64() * 1000.0);

        if result.status == ExportStatus::Bad {
            self.total_failures += 1;
            *self
                .failure_counts
                .entry(result.destination.clone())
                .or_insert(0) += 1;
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_exports: self.total_exports,
            total_failures: self.total_failures,
            failure_rate: if self.total_exports > 0 {
                self.total_failures as f64 / self.total_exports as f64 * 100.0
            } else {
                0.0
            },
            latency_ms: StatsSummary::from(&self.latency_stats),
            destination_failures: self.failure_counts.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_exports: u64,
    pub total_failures: u64,
    pub failure_rate: f64,
    pub latency_ms: StatsSummary,
    pub destination_failures: HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Export Metrics Summary ===")?;
        writeln!(f, "Total exports: {}", self.total_exports)?;
        writeln!(
            f,
            "Failed exports: {} ({:.2}%)",
            self.total_failures, self.failure_rate
        )?;
        writeln!(f, "Delivery latency (ms): {}", self.latency_ms)?;

        if !self.destination_failures.is_empty() {
            let mut failures: Vec<_> = self.destination_failures.iter().collect();
            failures.sort();
            writeln!(f, "Failures by destination:")?;
            for (destination, count) in failures {
                writeln!(f, "  {}: {}", destination, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Protocol;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [2.0, 4.0, 6.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 3);
        assert!((stats.mean() - 4.0).abs() < 1e-10);
        assert!((stats.min() - 2.0).abs() < 1e-10);
        assert!((stats.max() - 6.0).abs() < 1e-10);
        assert!((stats.variance() - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = ExportMetricsAggregator::new();

        let ok = ExportResult::good("graphite", Protocol::Graphite, 3);
        let bad = ExportResult::bad("collectd", Protocol::Collectd, "Socket error: refused");

        aggregator.update(&ok, Duration::from_millis(10));
        aggregator.update(&bad, Duration::from_millis(30));
        aggregator.update(&bad, Duration::from_millis(20));

        assert_eq!(aggregator.total_exports, 3);
        assert_eq!(aggregator.total_failures, 2);
        assert_eq!(aggregator.failure_counts.get("collectd"), Some(&2));
        assert!(aggregator.failure_counts.get("graphite").is_none());

        let summary = aggregator.summary();
        assert!((summary.latency_ms.mean - 20.0).abs() < 1e-6);

        aggregator.reset();
        assert_eq!(aggregator.total_exports, 0);
    }

    #[test]
    fn test_summary_display() {
        let summary = MetricsSummary {
            total_exports: 40,
            total_failures: 2,
            failure_rate: 5.0,
            latency_ms: StatsSummary::default(),
            destination_failures: HashMap::from([("carbon".to_string(), 2)]),
        };

        let output = format!("{}", summary);
        assert!(output.contains("Total exports: 40"));
        assert!(output.contains("5.00%"));
        assert!(output.contains("carbon: 2"));
        assert!(output.contains("N/A"));
    }

    #[test]
    fn test_record_without_recorder() {
        // no recorder installed: calls are no-ops
        let result = ExportResult::good("log", Protocol::Log, 1);
        record_export_result(&result, Duration::from_millis(1));
        record_submit_report("log", &SubmitReport::default());
        record_batch(1, 1);
    }
}
