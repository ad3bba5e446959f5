//! Heartbeat Monitor Library
//!
//! Liveness collector (membership table, beacon listener, expiry sweeper,
//! snapshot presenter) and the beacon agent that reports into it.

pub mod agent;
pub mod api;
pub mod collector;
pub mod config;
pub mod error;
pub mod models;

use axum::{routing::get, Router};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::AppState;

/// Create the snapshot query router with the given state
pub fn create_router(state: AppState) -> Router {
    let public_dir = ServeDir::new(&state.config.public_dir);

    Router::new()
        // Snapshot views
        .route("/", get(api::members::list_html))
        .route("/api/members", get(api::members::list_json))
        .route("/api/members/:address", get(api::members::get_member))
        .route("/api/status", get(api::health::membership_status))
        // Live membership changes
        .route("/api/events", get(api::events::stream_events))
        // Health check
        .route("/health", get(api::health::health_check))
        // Metrics (Prometheus)
        .route("/metrics", get(api::metrics::metrics_handler))
        // Static assets
        .nest_service("/public", public_dir)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve the snapshot router on `listener` until `cancel` fires.
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    cancel: tokio_util::sync::CancellationToken,
) -> error::AppResult<()> {
    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;
    Ok(())
}
