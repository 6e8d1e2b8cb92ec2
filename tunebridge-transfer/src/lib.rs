//! tunebridge-transfer library interface
//!
//! Exposes the transfer pipeline and HTTP surface for the binary and for
//! integration testing

pub mod api;
pub mod clients;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::services::TransferOrchestrator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Runs one transfer per request
    pub orchestrator: TransferOrchestrator,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last transfer error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(orchestrator: TransferOrchestrator) -> Self {
        Self {
            orchestrator,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::transfer_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
