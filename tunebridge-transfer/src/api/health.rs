//! `GET /health`: liveness plus the last transfer failure, so an operator
//! can tell a broken token from a healthy idle service.

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

const SERVICE_NAME: &str = "tunebridge";

#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// Always "ok" while the server answers
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    /// Omitted until some transfer fails
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

fn seconds_since(start: DateTime<Utc>) -> u64 {
    u64::try_from((Utc::now() - start).num_seconds()).unwrap_or(0)
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        module: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: seconds_since(state.startup_time),
        last_error: state.last_error.read().await.clone(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
