//! Paced worker - delivers one queued batch, one sub-batch per period tick

use std::sync::Arc;

use tokio::time::{interval, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, instrument, warn};

use contracts::{CancellationToken, Item, Limits, Processor};

use crate::batching::BatchPlan;
use crate::metrics::DispatchMetrics;

/// Outcome of one worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    /// Sub-batches the batch was sliced into
    pub total: usize,
    /// Sub-batches the processor accepted
    pub sent: usize,
    /// Sub-batches the processor failed
    pub failed: usize,
    /// Stopped early by worker cancellation
    pub cancelled: bool,
}

pub(crate) struct PacedWorker<P> {
    pub(crate) batch_id: u64,
    pub(crate) processor: Arc<P>,
    pub(crate) limits: Limits,
    /// Stops the pacing loop between sub-batches
    pub(crate) cancel: CancellationToken,
    /// Processing context handed to every `process` call
    pub(crate) context: CancellationToken,
    pub(crate) metrics: Arc<DispatchMetrics>,
}

impl<P: Processor + Sync> PacedWorker<P> {
    /// Deliver `batch` in order; failures are logged and skipped, never retried
    #[instrument(
        name = "paced_worker",
        skip(self, batch),
        fields(batch_id = self.batch_id, items = batch.len())
    )]
    pub(crate) async fn run(self, batch: Vec<Item>) -> WorkerReport {
        self.metrics.worker_started();
        let report = self.deliver(&batch).await;
        self.metrics.worker_finished();

        debug!(
            sent = report.sent,
            failed = report.failed,
            total = report.total,
            "Worker finished"
        );
        report
    }

    async fn deliver(&self, batch: &[Item]) -> WorkerReport {
        let plan = match BatchPlan::new(batch.len(), self.limits.capacity) {
            Ok(plan) => plan,
            Err(e) => {
                error!(error = %e, "Batch cannot be sliced, dropping it");
                return WorkerReport::default();
            }
        };

        let mut report = WorkerReport {
            total: plan.batch_count(),
            ..WorkerReport::default()
        };
        let mut ticker = self.ticker().await;

        for (index, range) in plan.enumerate() {
            if index > 0 && !self.wait_tick(&mut ticker).await {
                warn!(
                    sent = report.sent,
                    remaining = report.total - index,
                    "Worker cancelled between sub-batches"
                );
                report.cancelled = true;
                break;
            }

            let sub_batch = &batch[range.clone()];
            let started = Instant::now();
            match self.processor.process(sub_batch, &self.context).await {
                Ok(()) => {
                    self.metrics.record_sent(sub_batch.len(), started.elapsed());
                    report.sent += 1;
                    debug!(sub_batch = index, size = sub_batch.len(), "Sub-batch sent");
                }
                Err(e) => {
                    self.metrics.record_failure();
                    report.failed += 1;
                    error!(
                        processor = %self.processor.name(),
                        sub_batch = index,
                        start = range.start,
                        end = range.end,
                        error = %e,
                        "Sub-batch processing failed"
                    );
                }
            }
        }

        report
    }

    /// Interval with its immediate first tick already consumed; `None` when unpaced
    async fn ticker(&self) -> Option<Interval> {
        if self.limits.is_unpaced() {
            return None;
        }
        let mut ticker = interval(self.limits.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        Some(ticker)
    }

    /// Wait for the next tick; false if the worker was cancelled first
    async fn wait_tick(&self, ticker: &mut Option<Interval>) -> bool {
        match ticker {
            None => !self.cancel.is_cancelled(),
            Some(ticker) => tokio::select! {
                biased;
                _ = self.cancel.cancelled() => false,
                _ = ticker.tick() => true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatchMode;
    use contracts::{blank_batch, ProcessError};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Processor that records (send time, size) and fails chosen calls
    struct RecordingProcessor {
        limits: Limits,
        fail_calls: Vec<usize>,
        sends: Mutex<Vec<(Instant, usize)>>,
    }

    impl RecordingProcessor {
        fn new(capacity: u64, period: Duration) -> Self {
            Self {
                limits: Limits::new(capacity, period),
                fail_calls: Vec::new(),
                sends: Mutex::new(Vec::new()),
            }
        }
    }

    impl Processor for RecordingProcessor {
        fn name(&self) -> &str {
            "recording"
        }

        fn limits(&self) -> Limits {
            self.limits
        }

        async fn process(
            &self,
            batch: &[Item],
            _cancel: &CancellationToken,
        ) -> Result<(), ProcessError> {
            let call = {
                let mut sends = self.sends.lock().unwrap();
                sends.push((Instant::now(), batch.len()));
                sends.len()
            };
            if self.fail_calls.contains(&call) {
                return Err(ProcessError::rejected("recording", "mock failure"));
            }
            Ok(())
        }
    }

    fn worker(
        processor: &Arc<RecordingProcessor>,
        cancel: CancellationToken,
    ) -> PacedWorker<RecordingProcessor> {
        PacedWorker {
            batch_id: 1,
            processor: Arc::clone(processor),
            limits: processor.limits,
            cancel,
            context: CancellationToken::new(),
            metrics: Arc::new(DispatchMetrics::new(DispatchMode::Queued)),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_batches_paced_one_per_period() {
        let period = Duration::from_millis(50);
        let processor = Arc::new(RecordingProcessor::new(2, period));
        let started = Instant::now();

        let report = worker(&processor, CancellationToken::new())
            .run(blank_batch(5))
            .await;

        assert_eq!(
            report,
            WorkerReport {
                total: 3,
                sent: 3,
                failed: 0,
                cancelled: false,
            }
        );
        let sends = processor.sends.lock().unwrap().clone();
        let sizes: Vec<usize> = sends.iter().map(|(_, size)| *size).collect();
        assert_eq!(sizes, vec![2, 2, 1]);

        assert_eq!(sends[0].0, started, "first sub-batch goes out immediately");
        for pair in sends.windows(2) {
            assert!(pair[1].0 - pair[0].0 >= period);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_stop_next_sub_batch() {
        let period = Duration::from_millis(20);
        let mut processor = RecordingProcessor::new(1, period);
        processor.fail_calls = vec![2];
        let processor = Arc::new(processor);

        let report = worker(&processor, CancellationToken::new())
            .run(blank_batch(3))
            .await;

        assert_eq!(report.sent, 2);
        assert_eq!(report.failed, 1);
        let sends = processor.sends.lock().unwrap().clone();
        assert_eq!(sends.len(), 3);
        assert!(sends[2].0 - sends[1].0 >= period);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_worker_stops_between_sub_batches() {
        let processor = Arc::new(RecordingProcessor::new(1, Duration::from_secs(1)));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(worker(&processor, cancel.clone()).run(blank_batch(4)));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        cancel.cancel();
        let report = handle.await.unwrap();

        assert!(report.cancelled);
        assert_eq!(report.sent, 2);
        assert_eq!(processor.sends.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unpaced_worker_sends_back_to_back() {
        let processor = Arc::new(RecordingProcessor::new(2, Duration::ZERO));

        let report = worker(&processor, CancellationToken::new())
            .run(blank_batch(6))
            .await;

        assert_eq!(report.sent, 3);
    }

    #[tokio::test]
    async fn test_zero_capacity_drops_batch() {
        let processor = Arc::new(RecordingProcessor::new(0, Duration::from_millis(5)));

        let report = worker(&processor, CancellationToken::new())
            .run(blank_batch(2))
            .await;

        assert_eq!(report, WorkerReport::default());
        assert!(processor.sends.lock().unwrap().is_empty());
    }
}
