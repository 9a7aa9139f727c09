//! Dispatch metric recording
//!
//! Thin wrappers over the `metrics` facade. Without an installed recorder every call is a no-op.

use contracts::Limits;
use metrics::{counter, gauge, histogram};

/// Record the limits a processor declared
pub fn record_limits(processor: &str, limits: &Limits) {
    gauge!("pacer_processor_capacity", "processor" => processor.to_string())
        .set(limits.capacity as f64);
    gauge!("pacer_processor_period_ms", "processor" => processor.to_string())
        .set(limits.period.as_secs_f64() * 1000.0);
}

/// Record one batch delivered to the processor
pub fn record_batch_sent(mode: &'static str, size: usize, latency_ms: f64) {
    counter!("pacer_batches_sent_total", "mode" => mode).increment(1);
    counter!("pacer_items_sent_total", "mode" => mode).increment(size as u64);
    histogram!("pacer_batch_size", "mode" => mode).record(size as f64);
    histogram!("pacer_process_latency_ms", "mode" => mode).record(latency_ms);
}

/// Record one batch the processor failed
pub fn record_batch_failed(mode: &'static str) {
    counter!("pacer_batches_failed_total", "mode" => mode).increment(1);
}

/// Record a blocking dispatch refused because the pacing window elapsed
pub fn record_overload(sent: usize, total: usize) {
    counter!("pacer_overloads_total").increment(1);
    counter!("pacer_batches_skipped_total").increment(total.saturating_sub(sent) as u64);
}

/// Record a batch taken off the queue
pub fn record_batch_accepted(items: usize) {
    counter!("pacer_batches_accepted_total").increment(1);
    histogram!("pacer_accepted_batch_items").record(items as f64);
}

/// Record a paced worker start
pub fn record_worker_started() {
    gauge!("pacer_workers_in_flight").increment(1.0);
}

/// Record a paced worker exit
pub fn record_worker_finished() {
    gauge!("pacer_workers_in_flight").decrement(1.0);
}

/// Point-in-time view of a [`RunningStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            return f.write_str("no samples");
        }
        write!(
            f,
            "n={} mean={:.2} sd={:.2} range=[{:.2}, {:.2}]",
            self.count, self.mean, self.std_dev, self.min, self.max
        )
    }
}

/// Streaming mean/variance of latency samples (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    sum_sq_dev: f64,
    range: Option<(f64, f64)>,
}

impl RunningStats {
    pub fn push(&mut self, sample: f64) {
        self.count += 1;
        let delta = sample - self.mean;
        self.mean += delta / self.count as f64;
        self.sum_sq_dev += delta * (sample - self.mean);
        self.range = Some(match self.range {
            None => (sample, sample),
            Some((lo, hi)) => (lo.min(sample), hi.max(sample)),
        });
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// 0 with no samples
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample standard deviation; 0 below two samples
    pub fn std_dev(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        (self.sum_sq_dev / (self.count - 1) as f64).sqrt()
    }

    pub fn summary(&self) -> StatsSummary {
        let (min, max) = self.range.unwrap_or_default();
        StatsSummary {
            count: self.count,
            min,
            max,
            mean: self.mean,
            std_dev: self.std_dev(),
        }
    }
}
