//! Sink implementations
//!
//! Contains GraphiteSink, CollectdSink, and LogSink.

mod collectd;
mod graphite;
mod log;

pub use self::collectd::CollectdSink;
pub use self::graphite::GraphiteSink;
pub use self::log::LogSink;
