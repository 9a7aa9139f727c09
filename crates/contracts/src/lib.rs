//! # Contracts
//!
//! Interface contracts shared by the dispatcher, the HTTP gateway and the CLI.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Work model
//! - An [`Item`] is opaque; dispatchers only count it
//! - A [`Batch`] is an ordered run of items; sub-batches are borrowed slices of it
//! - [`Limits`] come from the [`Processor`] at runtime, never from configuration

mod error;
mod item;
mod limits;
mod processor;

pub use error::*;
pub use item::*;
pub use limits::*;
pub use processor::{LocalProcessor, Processor};
pub use tokio_util::sync::CancellationToken;
