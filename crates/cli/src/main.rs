//! # Pacer CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 同步或队列分发器前的 HTTP 服务
//! - 有效配置展示
//! - 优雅关闭处理

mod cli;
mod commands;
mod error;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_serve};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Pacer starting");

    let result = match &cli.command {
        Commands::Serve(args) => run_serve(args).await.map_err(anyhow::Error::from),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    let directive = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    // The exporter is installed by `serve` only
    observability::init(
        ObservabilityConfig::default()
            .with_format(cli.log_format.into())
            .with_default_directive(directive),
    )
}
