//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;

use contracts::{Limits, Processor};
use dispatcher::QueueConfig;
use gateway::BodyFormat;

use crate::cli::{DispatchArgs, InfoArgs, Mode};

/// Effective configuration for JSON output
#[derive(Serialize)]
struct DispatchInfo {
    version: &'static str,
    mode: Mode,
    body_format: BodyFormat,
    processor: ProcessorInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    queue: Option<QueueConfig>,
}

#[derive(Serialize)]
struct ProcessorInfo {
    name: String,
    limits: Limits,
    latency_ms: u64,
    fail_every: u64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let info = build_dispatch_info(&args.dispatch);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize dispatch info")?;
        println!("{}", json);
    } else {
        print_dispatch_info(&info);
    }

    Ok(())
}

fn build_dispatch_info(settings: &DispatchArgs) -> DispatchInfo {
    let processor = settings.processor();
    let (body_format, queue) = match settings.mode {
        Mode::Blocking => (BodyFormat::Items, None),
        Mode::Queued => (BodyFormat::Counts, Some(settings.queue_config())),
    };

    DispatchInfo {
        version: env!("CARGO_PKG_VERSION"),
        mode: settings.mode,
        body_format,
        processor: ProcessorInfo {
            name: processor.name().to_string(),
            limits: processor.limits(),
            latency_ms: settings.latency_ms,
            fail_every: settings.fail_every,
        },
        queue,
    }
}

fn print_dispatch_info(info: &DispatchInfo) {
    println!("\n=== Dispatch Configuration ===\n");
    println!("Mode: {:?} (body: {:?})", info.mode, info.body_format);
    println!("\nProcessor '{}':", info.processor.name);
    println!("  Capacity: {} items/call", info.processor.limits.capacity);
    println!("  Period: {} ms", info.processor.limits.period.as_millis());
    println!("  Latency: {} ms", info.processor.latency_ms);
    if info.processor.fail_every > 0 {
        println!("  Fails every {} calls", info.processor.fail_every);
    }

    if let Some(queue) = &info.queue {
        println!("\nQueue:");
        if queue.capacity == 0 {
            println!("  Hand-off: unbuffered");
        } else {
            println!("  Buffered batches: {}", queue.capacity);
        }
        println!("  Shutdown: {:?}", queue.shutdown);
    }

    println!();
}
