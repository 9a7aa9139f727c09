//! # Observability
//!
//! 可观测性模块：Tracing + Prometheus 指标。
//!
//! ## 功能
//!
//! - [`init`] 初始化 tracing subscriber (JSON/Pretty/Compact)
//! - [`install_prometheus`] 安装 Prometheus recorder 及其监听端口
//! - [`metrics`] `pacer_*` 指标记录与延迟统计
//!
//! ## 使用示例
//!
//! ```ignore
//! observability::init(ObservabilityConfig::default().with_format(LogFormat::Compact))?;
//! observability::record_batch_sent("queued", 2, 0.4);
//! ```

pub mod metrics;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use crate::metrics::{
    record_batch_accepted, record_batch_failed, record_batch_sent, record_limits,
    record_overload, record_worker_finished, record_worker_started, RunningStats, StatsSummary,
};

/// Log line layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
    Compact,
}

/// Subscriber settings
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// Filter directive used when RUST_LOG is unset
    pub default_directive: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            default_directive: "info".to_string(),
        }
    }
}

impl ObservabilityConfig {
    pub fn with_format(mut self, log_format: LogFormat) -> Self {
        self.log_format = log_format;
        self
    }

    pub fn with_default_directive(mut self, directive: impl Into<String>) -> Self {
        self.default_directive = directive.into();
        self
    }
}

/// Install the global subscriber
///
/// RUST_LOG takes precedence over `default_directive`.
pub fn init(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_directive));

    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::debug!(log_format = ?config.log_format, "Tracing initialized");
    Ok(())
}

/// Install the Prometheus recorder with its own HTTP listener
///
/// Until this runs every `metrics` call is a no-op.
pub fn install_prometheus(addr: SocketAddr) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .with_context(|| format!("Failed to install Prometheus exporter on {addr}"))?;

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}
