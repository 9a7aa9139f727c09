//! QueuedDispatcher - fire-and-forget delivery through a queue and paced workers

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument, warn};

use contracts::{Batch, CancellationToken, Limits, Processor};

use crate::dispatch::{Dispatch, DispatchMode};
use crate::error::DispatchError;
use crate::metrics::{DispatchMetrics, MetricsSnapshot};
use crate::worker::PacedWorker;

/// What happens to in-flight workers when the run loop stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownPolicy {
    /// Wait for every worker to send its remaining sub-batches under a live context
    #[default]
    Drain,
    /// Cancel the processing context and stop workers at their next tick, then wait for them
    Abort,
    /// Leave workers running unsupervised; their processing context is cancelled
    Detach,
}

/// Queued dispatcher configuration
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct QueueConfig {
    /// Batches buffered ahead of the run loop; 0 = rendezvous hand-off
    pub capacity: usize,
    /// In-flight worker handling on shutdown
    pub shutdown: ShutdownPolicy,
}

/// Summary of a finished run loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Batches taken off the queue
    pub batches_accepted: u64,
    /// Buffered batches never dequeued
    pub batches_abandoned: u64,
    /// Workers still running when the loop stopped
    pub workers_in_flight_at_shutdown: usize,
    pub policy: ShutdownPolicy,
}

struct Envelope {
    batch: Batch,
    ack: Option<oneshot::Sender<()>>,
}

/// Submission side of a [`QueuedDispatcher`]
#[derive(Clone)]
pub struct Submitter {
    tx: mpsc::Sender<Envelope>,
    processor: Arc<str>,
    limits: Limits,
    rendezvous: bool,
    metrics: Arc<DispatchMetrics>,
}

impl Submitter {
    /// Limits cached when the dispatcher was built
    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    /// Enqueue a whole batch
    ///
    /// Waits while the queue is full. In rendezvous mode, resolves only once
    /// the run loop has taken the batch. Nothing about delivery is reported back.
    ///
    /// # Errors
    /// - [`DispatchError::ZeroCapacity`] for a non-empty batch under zero capacity
    /// - [`DispatchError::Closed`] when the run loop is gone
    #[instrument(name = "queued_submit", skip(self, batch), fields(items = batch.len()))]
    pub async fn submit(&self, batch: Batch) -> Result<(), DispatchError> {
        if self.limits.capacity == 0 && !batch.is_empty() {
            return Err(DispatchError::zero_capacity(&*self.processor, batch.len()));
        }

        if !self.rendezvous {
            return self
                .tx
                .send(Envelope { batch, ack: None })
                .await
                .map_err(|_| DispatchError::Closed);
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(Envelope {
                batch,
                ack: Some(ack_tx),
            })
            .await
            .map_err(|_| DispatchError::Closed)?;
        ack_rx.await.map_err(|_| DispatchError::Closed)
    }
}

impl Dispatch for Submitter {
    fn mode(&self) -> DispatchMode {
        DispatchMode::Queued
    }

    fn limits(&self) -> Limits {
        self.limits
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn dispatch(&self, batch: Batch) -> Result<(), DispatchError> {
        self.submit(batch).await
    }
}

/// Run loop of the queued dispatcher
///
/// Each dequeued batch gets its own [`PacedWorker`]; workers run concurrently
/// with each other and with further dequeues, and are tracked so shutdown can
/// drain, abort or detach them.
pub struct QueuedDispatcher<P> {
    processor: Arc<P>,
    limits: Limits,
    config: QueueConfig,
    rx: mpsc::Receiver<Envelope>,
    workers: TaskTracker,
    worker_cancel: CancellationToken,
    /// Processing context for every worker; bound to `shutdown` in `run` unless draining
    context: CancellationToken,
    metrics: Arc<DispatchMetrics>,
}

impl<P> QueuedDispatcher<P>
where
    P: Processor + Sync + 'static,
{
    /// Build the dispatcher and its submitter; limits are read once, here
    pub fn new(processor: Arc<P>, config: QueueConfig) -> (Self, Submitter) {
        let limits = processor.limits();
        observability::record_limits(processor.name(), &limits);

        let (tx, rx) = mpsc::channel(config.capacity.max(1));
        let metrics = Arc::new(DispatchMetrics::new(DispatchMode::Queued));

        let submitter = Submitter {
            tx,
            processor: Arc::from(processor.name()),
            limits,
            rendezvous: config.capacity == 0,
            metrics: Arc::clone(&metrics),
        };

        let dispatcher = Self {
            processor,
            limits,
            config,
            rx,
            workers: TaskTracker::new(),
            worker_cancel: CancellationToken::new(),
            context: CancellationToken::new(),
            metrics,
        };

        (dispatcher, submitter)
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    /// Run until `shutdown` fires or every submitter is dropped
    #[instrument(
        name = "queued_dispatcher_run",
        skip(self, shutdown),
        fields(processor = %self.processor.name())
    )]
    pub async fn run(mut self, shutdown: CancellationToken) -> RunReport {
        info!(
            capacity = self.limits.capacity,
            period_ms = self.limits.period.as_millis() as u64,
            queue_capacity = self.config.capacity,
            policy = ?self.config.shutdown,
            "Queued dispatcher started"
        );

        // Draining workers keep a live context; otherwise processors see the shutdown
        if self.config.shutdown != ShutdownPolicy::Drain {
            self.context = shutdown.child_token();
        }

        let mut batches_accepted: u64 = 0;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!(batches = batches_accepted, "Shutdown requested");
                    break;
                }
                envelope = self.rx.recv() => {
                    let Some(Envelope { batch, ack }) = envelope else {
                        info!(batches = batches_accepted, "All submitters dropped");
                        break;
                    };
                    if let Some(ack) = ack {
                        let _ = ack.send(());
                    }

                    batches_accepted += 1;
                    self.metrics.record_accepted(batch.len());

                    if batch.is_empty() {
                        debug!(batch_id = batches_accepted, "Empty batch skipped");
                        continue;
                    }
                    self.spawn_worker(batches_accepted, batch);
                }
            }
        }

        let batches_abandoned = self.abandon_buffered();
        self.finish(batches_accepted, batches_abandoned).await
    }

    /// Spawn the run loop as a background task
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<RunReport> {
        tokio::spawn(self.run(shutdown))
    }

    fn spawn_worker(&self, batch_id: u64, batch: Batch) {
        let worker = PacedWorker {
            batch_id,
            processor: Arc::clone(&self.processor),
            limits: self.limits,
            cancel: self.worker_cancel.clone(),
            context: self.context.clone(),
            metrics: Arc::clone(&self.metrics),
        };
        self.workers.spawn(worker.run(batch));
    }

    /// Close the queue and drop whatever is still buffered
    fn abandon_buffered(&mut self) -> u64 {
        self.rx.close();
        let mut abandoned = 0;
        while self.rx.try_recv().is_ok() {
            abandoned += 1;
        }
        if abandoned > 0 {
            warn!(batches = abandoned, "Buffered batches abandoned at shutdown");
        }
        abandoned
    }

    async fn finish(self, batches_accepted: u64, batches_abandoned: u64) -> RunReport {
        let in_flight = self.workers.len();
        self.workers.close();

        match self.config.shutdown {
            ShutdownPolicy::Drain => {
                info!(workers = in_flight, "Draining in-flight workers");
                self.workers.wait().await;
            }
            ShutdownPolicy::Abort => {
                info!(workers = in_flight, "Cancelling in-flight workers");
                self.worker_cancel.cancel();
                self.workers.wait().await;
            }
            ShutdownPolicy::Detach => {
                if in_flight > 0 {
                    warn!(workers = in_flight, "Leaving in-flight workers running");
                }
            }
        }

        info!("Queued dispatcher stopped");

        RunReport {
            batches_accepted,
            batches_abandoned,
            workers_in_flight_at_shutdown: in_flight,
            policy: self.config.shutdown,
        }
    }
}
