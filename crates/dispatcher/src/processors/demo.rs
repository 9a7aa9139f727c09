//! DemoProcessor - simulated downstream that logs batch sizes via tracing

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, instrument};

use contracts::{CancellationToken, Item, Limits, ProcessError, Processor};

/// Processor with fixed limits and a simulated per-call latency
///
/// Optionally fails every n-th call, for exercising failure paths end to end.
#[derive(Debug)]
pub struct DemoProcessor {
    name: String,
    limits: Limits,
    latency: Duration,
    fail_every: Option<u64>,
    calls: AtomicU64,
}

impl DemoProcessor {
    /// Create a processor declaring `capacity` items per `period`
    pub fn new(name: impl Into<String>, capacity: u64, period: Duration) -> Self {
        Self {
            name: name.into(),
            limits: Limits::new(capacity, period),
            latency: Duration::ZERO,
            fail_every: None,
            calls: AtomicU64::new(0),
        }
    }

    /// Time spent in every `process` call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail every `n`-th call (0 disables)
    pub fn fail_every(mut self, n: u64) -> Self {
        self.fail_every = (n > 0).then_some(n);
        self
    }

    /// Calls made so far, failed ones included
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Processor for DemoProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn limits(&self) -> Limits {
        self.limits
    }

    #[instrument(
        name = "demo_processor_process",
        skip(self, batch, cancel),
        fields(processor = %self.name, items = batch.len())
    )]
    async fn process(&self, batch: &[Item], cancel: &CancellationToken) -> Result<(), ProcessError> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;

        if !self.latency.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(ProcessError::cancelled(&self.name)),
                _ = sleep(self.latency) => {}
            }
        }

        if self.fail_every.is_some_and(|n| call % n == 0) {
            return Err(ProcessError::rejected(
                &self.name,
                format!("simulated failure on call {call}"),
            ));
        }

        info!(processor = %self.name, items = batch.len(), "Processed batch");
        Ok(())
    }
}
