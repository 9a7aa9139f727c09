//! `serve` command implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use dispatcher::{BlockingDispatcher, DispatchMetrics, QueuedDispatcher};
use gateway::{router, AppState, BodyFormat};

use crate::cli::{Mode, ServeArgs};
use crate::error::{CliError, Result};

/// Execute the `serve` command
pub async fn run_serve(args: &ServeArgs) -> Result<()> {
    if let Some(port) = args.metrics_port() {
        observability::install_prometheus(SocketAddr::from(([0, 0, 0, 0], port)))?;
    }

    let settings = &args.dispatch;
    let processor = settings.processor();
    let shutdown = CancellationToken::new();

    info!(
        mode = ?settings.mode,
        capacity = settings.capacity,
        period_ms = settings.period_ms,
        latency_ms = settings.latency_ms,
        "Dispatcher configured"
    );

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            warn!("Received shutdown signal, stopping...");
            shutdown.cancel();
        }
    });

    match settings.mode {
        Mode::Blocking => {
            let dispatcher =
                BlockingDispatcher::new(processor).with_cancellation(shutdown.child_token());
            let metrics = Arc::clone(dispatcher.metrics());
            let app = router(AppState::new(dispatcher, BodyFormat::Items));
            serve_app(app, &args.bind, shutdown).await?;
            log_summary(&metrics);
        }
        Mode::Queued => {
            let (dispatcher, submitter) =
                QueuedDispatcher::new(Arc::new(processor), settings.queue_config());
            let metrics = Arc::clone(dispatcher.metrics());
            let dispatcher_handle = dispatcher.spawn(shutdown.clone());

            let app = router(AppState::new(submitter, BodyFormat::Counts));
            let served = serve_app(app, &args.bind, shutdown.clone()).await;

            // The loop must stop even if the server failed before any signal
            shutdown.cancel();
            let report = dispatcher_handle
                .await
                .map_err(|e| CliError::dispatcher(e.to_string()))?;
            info!(
                batches_accepted = report.batches_accepted,
                batches_abandoned = report.batches_abandoned,
                workers_in_flight = report.workers_in_flight_at_shutdown,
                policy = ?report.policy,
                "Queued dispatcher finished"
            );
            log_summary(&metrics);
            served?;
        }
    }

    info!("Pacer finished");
    Ok(())
}

fn log_summary(metrics: &DispatchMetrics) {
    let snapshot = metrics.snapshot();
    info!(
        batches_sent = snapshot.batches_sent,
        items_sent = snapshot.items_sent,
        failures = snapshot.failures,
        overloads = snapshot.overloads,
        latency_ms = %metrics.latency_summary(),
        "Dispatch summary"
    );
}

/// Serve `app` on `bind` until `shutdown` fires
async fn serve_app(app: Router, bind: &str, shutdown: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|e| CliError::bind(bind, e))?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| CliError::serve(e.to_string()))
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
