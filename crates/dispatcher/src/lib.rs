//! # Dispatcher
//!
//! Metric export module.
//!
//! Responsible for:
//! - Binding destination options into a resolved `Destination`
//! - Templating metric paths
//! - Encoding check results for the line and binary packet protocols
//! - Delivering encoded bytes over TCP / UDP with bounded retry
//! - Isolating failures so every destination gets its own result

pub mod destination;
pub mod dispatcher;
pub mod encoding;
pub mod error;
pub mod metrics;
pub mod sinks;
pub mod template;
pub mod transport;

pub use contracts::{ExportBatch, ExportResult, MetricSink, SubmitResponse};
pub use destination::{bind_destination, resolve_destination, ProtocolDefaults};
pub use dispatcher::{create_dispatcher, Dispatcher, DispatcherConfig};
pub use encoding::{Encoded, Encoder, LineEncoder, PacketEncoder};
pub use error::DispatcherError;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use sinks::{CollectdSink, GraphiteSink, LogSink};
pub use template::{render_path, PathContext};
