use axum::{extract::State, response::IntoResponse};

use crate::api::AppState;

/// Prometheus metrics endpoint
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let members = state.table.len().await;
    ::metrics::gauge!("heartbeat_members", members as f64);

    let body = match &state.metrics {
        Some(handle) => handle.render(),
        // No recorder installed (tests, embedded use): expose the table size only
        None => format!(
            "# HELP heartbeat_members Sources currently considered alive\n\
             # TYPE heartbeat_members gauge\n\
             heartbeat_members {}\n",
            members
        ),
    };

    ([("content-type", "text/plain; charset=utf-8")], body)
}
