//! BlockingDispatcher - call-and-wait delivery with a fail-fast pacing budget

use std::sync::Arc;

use tracing::{debug, error, instrument, warn};

use contracts::{Batch, CancellationToken, Item, Limits, Processor};

use crate::batching::BatchPlan;
use crate::clock::{Clock, SystemClock};
use crate::dispatch::{Dispatch, DispatchMode};
use crate::error::DispatchError;
use crate::metrics::{DispatchMetrics, MetricsSnapshot};

/// What a successful blocking call delivered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub batches: usize,
    pub items: usize,
}

/// Dispatcher that delivers a whole submission inside the caller's call
///
/// The processor's limits are re-read on every call. Batches go out back to
/// back; once `period` has elapsed since the call started, the remaining
/// batches are refused with [`DispatchError::Overload`]. A zero period leaves
/// no budget, so any non-empty submission is refused before its first batch.
pub struct BlockingDispatcher<P, C = SystemClock> {
    processor: P,
    clock: C,
    cancel: CancellationToken,
    metrics: Arc<DispatchMetrics>,
}

impl<P: Processor> BlockingDispatcher<P> {
    /// Create a dispatcher on the system clock
    pub fn new(processor: P) -> Self {
        Self::with_clock(processor, SystemClock)
    }
}

impl<P: Processor, C: Clock> BlockingDispatcher<P, C> {
    /// Create a dispatcher with an explicit clock (tests drive time by hand)
    pub fn with_clock(processor: P, clock: C) -> Self {
        Self {
            processor,
            clock,
            cancel: CancellationToken::new(),
            metrics: Arc::new(DispatchMetrics::new(DispatchMode::Blocking)),
        }
    }

    /// Processing context handed to the processor on every call
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    /// Deliver `items` in capacity-sized batches, in order
    ///
    /// # Errors
    /// - [`DispatchError::Overload`] once the pacing window has elapsed; later batches are not sent
    /// - [`DispatchError::Processor`] on the first processor failure; later batches are not sent
    /// - [`DispatchError::ZeroCapacity`] when the processor accepts no items but `items` is non-empty
    #[instrument(
        name = "blocking_process_items",
        skip(self, items),
        fields(processor = %self.processor.name(), items = items.len())
    )]
    pub async fn process_items(&self, items: &[Item]) -> Result<DispatchOutcome, DispatchError> {
        let limits = self.processor.limits();
        let plan = BatchPlan::new(items.len(), limits.capacity)
            .map_err(|_| DispatchError::zero_capacity(self.processor.name(), items.len()))?;
        let total = plan.batch_count();

        let started = self.clock.now();
        let mut outcome = DispatchOutcome::default();

        for (index, range) in plan.enumerate() {
            let elapsed = self.clock.now().saturating_duration_since(started);
            if elapsed >= limits.period {
                self.metrics.record_overload(outcome.batches, total);
                warn!(
                    sent = outcome.batches,
                    total,
                    elapsed_ms = elapsed.as_millis() as u64,
                    period_ms = limits.period.as_millis() as u64,
                    "Pacing window elapsed, refusing remaining batches"
                );
                return Err(DispatchError::Overload {
                    sent: outcome.batches,
                    total,
                    elapsed,
                    period: limits.period,
                });
            }

            let batch = &items[range];
            let call_started = self.clock.now();
            if let Err(e) = self.processor.process(batch, &self.cancel).await {
                self.metrics.record_failure();
                error!(batch = index, size = batch.len(), error = %e, "Batch processing failed");
                return Err(e.into());
            }
            self.metrics.record_sent(
                batch.len(),
                self.clock.now().saturating_duration_since(call_started),
            );

            outcome.batches += 1;
            outcome.items += batch.len();
            debug!(batch = index, size = batch.len(), total, "Batch sent");
        }

        Ok(outcome)
    }
}

impl<P, C> Dispatch for BlockingDispatcher<P, C>
where
    P: Processor + Sync,
    C: Clock,
{
    fn mode(&self) -> DispatchMode {
        DispatchMode::Blocking
    }

    fn limits(&self) -> Limits {
        self.processor.limits()
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn dispatch(&self, batch: Batch) -> Result<(), DispatchError> {
        self.process_items(&batch).await.map(|_| ())
    }
}
