//! Processor trait - the downstream capability batches are delivered to
//!
//! Defines the abstract interface for processors.

use tokio_util::sync::CancellationToken;

use crate::{Item, Limits, ProcessError};

/// Downstream processing capability
///
/// One instance is shared by every concurrent worker, so all methods take `&self`.
#[trait_variant::make(Processor: Send)]
pub trait LocalProcessor {
    /// Processor name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Declared limits; read once per dispatch call or once per queued dispatcher
    fn limits(&self) -> Limits;

    /// Process one batch of at most `limits().capacity` items
    ///
    /// `cancel` is the processing context. Honouring it is up to the implementation.
    ///
    /// # Errors
    /// Returns the processing failure (should include context)
    async fn process(&self, batch: &[Item], cancel: &CancellationToken) -> Result<(), ProcessError>;
}
