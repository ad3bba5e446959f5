use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::AppState;
use crate::collector::TIMEOUT_MULTIPLIER;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct MembershipStatusResponse {
    pub members: usize,
    pub beacon_interval_secs: u64,
    pub timeout_secs: u64,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Member count and the expiry policy currently in force
pub async fn membership_status(State(state): State<AppState>) -> Json<MembershipStatusResponse> {
    let interval = state.config.beacon_interval_secs;
    Json(MembershipStatusResponse {
        members: state.table.len().await,
        beacon_interval_secs: interval,
        timeout_secs: interval.saturating_mul(TIMEOUT_MULTIPLIER as u64),
    })
}
