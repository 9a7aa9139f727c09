//! Dispatcher metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use observability::{RunningStats, StatsSummary};
use serde::Serialize;

use crate::dispatch::DispatchMode;

/// Counters for a single dispatcher
///
/// Every update is also forwarded to the process-wide `metrics` recorder.
#[derive(Debug)]
pub struct DispatchMetrics {
    mode: DispatchMode,
    /// Batches the processor accepted
    batches_sent: AtomicU64,
    /// Items inside those batches
    items_sent: AtomicU64,
    /// Batches the processor failed
    failures: AtomicU64,
    /// Blocking calls refused because the window elapsed
    overloads: AtomicU64,
    /// Batches taken off the queue
    batches_accepted: AtomicU64,
    /// Paced workers currently running
    workers_in_flight: AtomicUsize,
    /// Processor call latency (ms)
    latency: Mutex<RunningStats>,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new(mode: DispatchMode) -> Self {
        Self {
            mode,
            batches_sent: AtomicU64::new(0),
            items_sent: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            overloads: AtomicU64::new(0),
            batches_accepted: AtomicU64::new(0),
            workers_in_flight: AtomicUsize::new(0),
            latency: Mutex::new(RunningStats::default()),
        }
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    pub fn batches_sent(&self) -> u64 {
        self.batches_sent.load(Ordering::Relaxed)
    }

    pub fn items_sent(&self) -> u64 {
        self.items_sent.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn overloads(&self) -> u64 {
        self.overloads.load(Ordering::Relaxed)
    }

    pub fn batches_accepted(&self) -> u64 {
        self.batches_accepted.load(Ordering::Relaxed)
    }

    pub fn workers_in_flight(&self) -> usize {
        self.workers_in_flight.load(Ordering::Relaxed)
    }

    /// Record a batch the processor accepted
    pub fn record_sent(&self, size: usize, latency: Duration) {
        let latency_ms = latency.as_secs_f64() * 1000.0;
        self.batches_sent.fetch_add(1, Ordering::Relaxed);
        self.items_sent.fetch_add(size as u64, Ordering::Relaxed);
        if let Ok(mut stats) = self.latency.lock() {
            stats.push(latency_ms);
        }
        observability::record_batch_sent(self.mode.as_str(), size, latency_ms);
    }

    /// Record a batch the processor failed
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        observability::record_batch_failed(self.mode.as_str());
    }

    /// Record a refused blocking call
    pub fn record_overload(&self, sent: usize, total: usize) {
        self.overloads.fetch_add(1, Ordering::Relaxed);
        observability::record_overload(sent, total);
    }

    /// Record a dequeued batch
    pub fn record_accepted(&self, items: usize) {
        self.batches_accepted.fetch_add(1, Ordering::Relaxed);
        observability::record_batch_accepted(items);
    }

    pub fn worker_started(&self) {
        self.workers_in_flight.fetch_add(1, Ordering::Relaxed);
        observability::record_worker_started();
    }

    pub fn worker_finished(&self) {
        self.workers_in_flight.fetch_sub(1, Ordering::Relaxed);
        observability::record_worker_finished();
    }

    /// Processor call latency distribution (ms)
    pub fn latency_summary(&self) -> StatsSummary {
        self.latency
            .lock()
            .map(|stats| stats.summary())
            .unwrap_or_default()
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mean_latency_ms = self
            .latency
            .lock()
            .map(|stats| stats.mean())
            .unwrap_or_default();

        MetricsSnapshot {
            mode: self.mode,
            batches_sent: self.batches_sent(),
            items_sent: self.items_sent(),
            failures: self.failures(),
            overloads: self.overloads(),
            batches_accepted: self.batches_accepted(),
            workers_in_flight: self.workers_in_flight(),
            mean_latency_ms,
        }
    }
}

/// Snapshot of dispatcher metrics (for reporting)
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricsSnapshot {
    pub mode: DispatchMode,
    pub batches_sent: u64,
    pub items_sent: u64,
    pub failures: u64,
    pub overloads: u64,
    pub batches_accepted: u64,
    pub workers_in_flight: usize,
    pub mean_latency_ms: f64,
}
