//! Dispatch trait - the seam the HTTP gateway is generic over

use std::fmt;

use serde::Serialize;

use contracts::{Batch, Limits};

use crate::error::DispatchError;
use crate::metrics::MetricsSnapshot;

/// Delivery contract of a dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Call-and-wait, fails fast once the pacing window elapses
    Blocking,
    /// Fire-and-forget through a queue and paced workers
    Queued,
}

impl DispatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocking => "blocking",
            Self::Queued => "queued",
        }
    }
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared interface of both dispatcher variants
#[trait_variant::make(Dispatch: Send)]
pub trait LocalDispatch {
    fn mode(&self) -> DispatchMode;

    /// Limits in effect for the next dispatch
    fn limits(&self) -> Limits;

    fn metrics(&self) -> MetricsSnapshot;

    /// Hand a whole batch to the dispatcher
    ///
    /// Blocking dispatchers resolve after delivery; queued ones after the hand-off.
    async fn dispatch(&self, batch: Batch) -> Result<(), DispatchError>;
}
