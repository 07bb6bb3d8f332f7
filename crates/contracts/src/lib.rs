//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the metric forwarder.
//! Business crates depend only on this crate, never on each other's internals.
//!
//! ## Time Model
//! - Export timestamps are whole seconds since the Unix epoch (UTC)
//! - One timestamp is taken per dispatch pass and shared by every record of that pass

mod blueprint;
mod check_result;
mod destination;
mod error;
mod export;
mod settings;
mod sink;

pub use blueprint::*;
pub use check_result::*;
pub use destination::*;
pub use error::*;
pub use export::*;
pub use settings::SettingsProvider;
pub use sink::*;
