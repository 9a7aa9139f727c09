//! CLI argument definitions using clap.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use dispatcher::{DemoProcessor, QueueConfig, ShutdownPolicy};

/// Pacer - rate-limited batch dispatcher
#[derive(Parser, Debug)]
#[command(
    name = "pacer",
    author,
    version,
    about = "Rate-limited batch dispatcher",
    long_about = "Accepts JSON item lists over HTTP, slices them into batches no larger than \n\
                  the processor's capacity, and paces delivery by the processor's period."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "PACER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "PACER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the submission endpoint
    Serve(ServeArgs),

    /// Display the effective configuration
    Info(InfoArgs),
}

/// Arguments for the `serve` command
#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:8080", env = "PACER_BIND")]
    pub bind: String,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "PACER_METRICS_PORT")]
    pub metrics_port: u16,

    #[command(flatten)]
    pub dispatch: DispatchArgs,
}

impl ServeArgs {
    pub fn metrics_port(&self) -> Option<u16> {
        (self.metrics_port != 0).then_some(self.metrics_port)
    }
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub dispatch: DispatchArgs,
}

/// Dispatcher and demo processor settings
#[derive(Args, Debug, Clone)]
pub struct DispatchArgs {
    /// Delivery contract
    #[arg(long, value_enum, default_value = "queued", env = "PACER_MODE")]
    pub mode: Mode,

    /// Items the processor accepts per call
    #[arg(long, default_value = "10", env = "PACER_CAPACITY")]
    pub capacity: u64,

    /// Minimum spacing between processor calls, in milliseconds
    #[arg(long, default_value = "2000", env = "PACER_PERIOD_MS")]
    pub period_ms: u64,

    /// Simulated processing time per call, in milliseconds
    #[arg(long, default_value = "2000", env = "PACER_LATENCY_MS")]
    pub latency_ms: u64,

    /// Fail every n-th processor call (0 = never)
    #[arg(long, default_value = "0", env = "PACER_FAIL_EVERY")]
    pub fail_every: u64,

    /// Batches buffered ahead of the run loop (0 = hand-off), queued mode only
    #[arg(long, default_value = "0", env = "PACER_QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    /// In-flight worker handling on shutdown, queued mode only
    #[arg(long, value_enum, default_value = "drain", env = "PACER_SHUTDOWN")]
    pub shutdown: ShutdownArg,
}

impl DispatchArgs {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    /// Build the demo processor these settings describe
    pub fn processor(&self) -> DemoProcessor {
        DemoProcessor::new("demo", self.capacity, self.period())
            .with_latency(self.latency())
            .fail_every(self.fail_every)
    }

    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            capacity: self.queue_capacity,
            shutdown: self.shutdown.into(),
        }
    }
}

/// Delivery contract selector
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Deliver inside the request, 429 once the period elapses
    Blocking,
    /// Enqueue and return, deliver from paced workers
    Queued,
}

/// Shutdown policy selector
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownArg {
    Drain,
    Abort,
    Detach,
}

impl From<ShutdownArg> for ShutdownPolicy {
    fn from(arg: ShutdownArg) -> Self {
        match arg {
            ShutdownArg::Drain => ShutdownPolicy::Drain,
            ShutdownArg::Abort => ShutdownPolicy::Abort,
            ShutdownArg::Detach => ShutdownPolicy::Detach,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
