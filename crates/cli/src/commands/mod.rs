//! Command implementations.

mod info;
mod submit;
mod validate;

pub use info::run_info;
pub use submit::run_submit;
pub use validate::run_validate;
