//! Router and handlers

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use dispatcher::Dispatch;

use crate::decode::{decode_batch, BodyFormat};
use crate::error::GatewayError;

/// Shared handler state
pub struct AppState<D> {
    dispatcher: D,
    format: BodyFormat,
}

impl<D> AppState<D> {
    pub fn new(dispatcher: D, format: BodyFormat) -> Self {
        Self { dispatcher, format }
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn format(&self) -> BodyFormat {
        self.format
    }
}

/// Build the HTTP router around a dispatcher
pub fn router<D>(state: AppState<D>) -> Router
where
    D: Dispatch + Sync + 'static,
{
    Router::new()
        .route("/process", post(process::<D>))
        .route("/limits", get(limits::<D>))
        .route("/metrics", get(metrics::<D>))
        .route("/health", get(health::<D>))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Submission endpoint
///
/// POST /process
async fn process<D>(
    State(state): State<Arc<AppState<D>>>,
    body: Bytes,
) -> Result<StatusCode, GatewayError>
where
    D: Dispatch + Sync,
{
    let batch = decode_batch(&body, state.format).inspect_err(|e| {
        debug!(error = %e, "Rejected malformed body");
    })?;
    let items = batch.len();

    state.dispatcher.dispatch(batch).await.map_err(|e| {
        let e = GatewayError::from(e);
        warn!(items, status = %e.status(), error = %e, "Dispatch failed");
        e
    })?;

    Ok(StatusCode::OK)
}

/// GET /limits
async fn limits<D: Dispatch + Sync>(State(state): State<Arc<AppState<D>>>) -> impl IntoResponse {
    Json(state.dispatcher.limits())
}

/// GET /metrics
async fn metrics<D: Dispatch + Sync>(State(state): State<Arc<AppState<D>>>) -> impl IntoResponse {
    Json(state.dispatcher.metrics())
}

/// GET /health
async fn health<D: Dispatch + Sync>(State(state): State<Arc<AppState<D>>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "mode": state.dispatcher.mode(),
        "format": state.format,
        "version": env!("CARGO_PKG_VERSION")
    }))
}
