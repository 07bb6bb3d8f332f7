//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Metric Forwarder - export check results to line and packet protocol collectors
#[derive(Parser, Debug)]
#[command(
    name = "metric-forwarder",
    author,
    version,
    about = "Export check performance data to metric collectors",
    long_about = "Exports the performance data of executed checks to every configured \n\
                  destination: plaintext line protocol over TCP or binary packets over UDP.\n\n\
                  Each destination reports its own good/bad status; one failing collector \n\
                  never affects the others."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "METRIC_FORWARDER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "METRIC_FORWARDER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit check results to the configured destinations
    Submit(SubmitArgs),

    /// Validate configuration file without sending anything
    Validate(ValidateArgs),

    /// Display resolved destinations with defaults applied
    Info(InfoArgs),
}

/// Arguments for the `submit` command
#[derive(Parser, Debug, Clone)]
pub struct SubmitArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "export.toml",
        env = "METRIC_FORWARDER_CONFIG"
    )]
    pub config: PathBuf,

    /// Check results as JSON ("-" reads standard input)
    #[arg(short, long, default_value = "-", env = "METRIC_FORWARDER_RESULTS")]
    pub results: PathBuf,

    /// Only submit to these destinations (repeatable, default: all)
    #[arg(short, long = "destination", value_name = "ALIAS")]
    pub destinations: Vec<String>,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// Host name of this agent (default: config, then system host name)
    #[arg(long, env = "METRIC_FORWARDER_SENDER_HOST")]
    pub sender_host: Option<String>,

    /// Number of submission passes (0 = until interrupted)
    #[arg(long, default_value = "1", env = "METRIC_FORWARDER_REPEAT")]
    pub repeat: u64,

    /// Seconds between passes when repeating
    #[arg(long, default_value = "60", env = "METRIC_FORWARDER_INTERVAL")]
    pub interval: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "METRIC_FORWARDER_METRICS_PORT")]
    pub metrics_port: u16,

    /// Output the response as JSON
    #[arg(long)]
    pub json: bool,

    /// Exit with an error when any destination reports bad
    #[arg(long)]
    pub strict: bool,
}

/// Destination option overrides applied to every selected destination
#[derive(Parser, Debug, Clone, Default)]
pub struct OverrideArgs {
    /// Collector host (accepts host:port)
    #[arg(long)]
    pub host: Option<String>,

    /// Collector port
    #[arg(long)]
    pub port: Option<u16>,

    /// Resolve/connect/send timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Maximum connection attempts
    #[arg(long)]
    pub retry: Option<u32>,

    /// Metric path template
    #[arg(long)]
    pub perf_path: Option<String>,

    /// Send performance data
    #[arg(long, value_name = "BOOL")]
    pub send_perfdata: Option<bool>,

    /// Maximum binary packet size in bytes
    #[arg(short = 'l', long)]
    pub payload_length: Option<u32>,

    /// Alias of --payload-length
    #[arg(long)]
    pub buffer_length: Option<u32>,

    /// Shared secret for the packet protocol (not used for signing)
    #[arg(long, env = "METRIC_FORWARDER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Seconds added to every exported timestamp
    #[arg(long, allow_negative_numbers = true)]
    pub time_offset: Option<i64>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(
        short,
        long,
        default_value = "export.toml",
        env = "METRIC_FORWARDER_CONFIG"
    )]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "export.toml",
        env = "METRIC_FORWARDER_CONFIG"
    )]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
