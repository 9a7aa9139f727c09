//! Command implementations.

mod info;
mod serve;

pub use info::run_info;
pub use serve::run_serve;
