//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//!
//! - Tracing 初始化 (JSON/Pretty/Compact 格式，输出到 stderr)
//! - Prometheus 指标导出
//! - 导出结果指标收集与统计
//!
//! ## 使用示例
//!
//! ```ignore
//! use observability::{init_tracing, metrics, LogFormat, TracingConfig};
//!
//! // 初始化
//! init_tracing(&TracingConfig::from_verbosity(LogFormat::Json, 1, false))?;
//!
//! // 记录投递结果
//! for result in &response.results {
//!     metrics::record_export_result(result, elapsed);
//! }
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::metrics::{
    record_batch, record_export_result, record_submit_report, ExportMetricsAggregator,
    MetricsSummary, RunningStats, StatsSummary,
};

/// 日志格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON 结构化日志
    Json,
    /// 人类可读格式
    #[default]
    Pretty,
    /// 紧凑单行格式
    Compact,
}

/// Tracing 配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// 日志格式
    pub log_format: LogFormat,
    /// 默认日志级别（RUST_LOG 未设置时使用）
    pub default_log_level: String,
    /// 为 true 时忽略 RUST_LOG，只输出告警
    pub quiet: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            default_log_level: "info".to_string(),
            quiet: false,
        }
    }
}

impl TracingConfig {
    /// 根据 `-v` 次数与 `-q` 推导日志级别
    pub fn from_verbosity(log_format: LogFormat, verbose: u8, quiet: bool) -> Self {
        let level = match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        Self {
            log_format,
            default_log_level: level.to_string(),
            quiet,
        }
    }

    fn filter(&self) -> EnvFilter {
        if self.quiet {
            EnvFilter::new("warn")
        } else {
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&self.default_log_level))
        }
    }
}

/// 初始化 Tracing
///
/// 日志写到 stderr，stdout 留给命令输出。
pub fn init_tracing(config: &TracingConfig) -> Result<()> {
    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
    };

    tracing_subscriber::registry()
        .with(config.filter())
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::debug!(
        log_format = ?config.log_format,
        level = %config.default_log_level,
        quiet = config.quiet,
        "Tracing initialized"
    );
    Ok(())
}

/// 仅初始化 Prometheus 指标（不初始化 Tracing）
///
/// 用于 Tracing 已由其他模块初始化的场景。
pub fn init_metrics_only(port: u16) -> Result<()> {
    let builder = PrometheusBuilder::new();
    builder
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tracing_config() {
        let config = TracingConfig::default();
        assert_eq!(config.default_log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(!config.quiet);
    }

    #[test]
    fn test_verbosity_levels() {
        let levels: Vec<_> = (0..4)
            .map(|v| TracingConfig::from_verbosity(LogFormat::Json, v, false).default_log_level)
            .collect();
        assert_eq!(levels, ["info", "debug", "trace", "trace"]);

        let quiet = TracingConfig::from_verbosity(LogFormat::Compact, 2, true);
        assert!(quiet.quiet);
        assert_eq!(quiet.log_format, LogFormat::Compact);
    }
}
