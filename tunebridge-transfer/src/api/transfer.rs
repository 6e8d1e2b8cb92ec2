//! Transfer endpoints
//!
//! - `GET /transfer/events`: runs a transfer and streams every progress
//!   event as an SSE `data:` frame the moment it is produced
//! - `POST /transfer`: runs a transfer to the end and returns all event
//!   lines plus the summary as JSON

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::services::{TransferHandle, TransferOutcome, TransferRequest};
use crate::AppState;
use tunebridge_common::sse::{progress_sse_stream, single_event_sse};
use tunebridge_common::{ProgressEvent, TransferSummary};

/// Query parameters of `GET /transfer/events`
#[derive(Debug, Default, Deserialize)]
pub struct TransferParams {
    pub source_url: Option<String>,
    pub destination_url: Option<String>,
}

/// Body of `POST /transfer`
#[derive(Debug, Deserialize)]
pub struct TransferBody {
    pub source_url: String,
    pub destination_url: String,
}

/// Response of `POST /transfer`
#[derive(Debug, Serialize)]
pub struct TransferReport {
    /// "completed", "completed_with_errors" or "failed"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<TransferSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Every event line in emission order
    pub events: Vec<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// GET /transfer/events
pub async fn transfer_event_stream(
    State(state): State<AppState>,
    Query(params): Query<TransferParams>,
) -> Response {
    let (Some(source_url), Some(destination_url)) = (
        non_blank(params.source_url),
        non_blank(params.destination_url),
    ) else {
        warn!("SSE transfer requested without both playlist URLs");
        return single_event_sse(ProgressEvent::error(
            "Playlist URLs not provided. Please restart transfer.",
        ))
        .into_response();
    };

    info!("SSE: starting streamed transfer");
    let TransferHandle { events, outcome } = state
        .orchestrator
        .spawn(TransferRequest::new(source_url, destination_url));
    record_outcome(state.last_error.clone(), outcome);

    progress_sse_stream(events).into_response()
}

/// POST /transfer
pub async fn run_transfer(
    State(state): State<AppState>,
    Json(body): Json<TransferBody>,
) -> ApiResult<Json<TransferReport>> {
    if body.source_url.trim().is_empty() || body.destination_url.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "source_url and destination_url are required".to_string(),
        ));
    }

    let TransferHandle {
        mut events,
        outcome,
    } = state
        .orchestrator
        .spawn(TransferRequest::new(body.source_url, body.destination_url));

    let mut lines = Vec::new();
    while let Some(event) = events.recv().await {
        lines.push(event.to_string());
    }

    let outcome = outcome
        .await
        .map_err(|e| ApiError::Internal(format!("Transfer task failed: {}", e)))?;

    let report = match outcome {
        TransferOutcome::Completed {
            summary,
            write_error,
        } => {
            let status = if write_error.is_some() {
                "completed_with_errors"
            } else {
                "completed"
            };
            if let Some(e) = &write_error {
                *state.last_error.write().await = Some(e.to_string());
            }
            TransferReport {
                status: status.to_string(),
                summary: Some(summary),
                error: write_error.map(|e| e.to_string()),
                events: lines,
            }
        }
        TransferOutcome::Failed { error, .. } => {
            *state.last_error.write().await = Some(error.to_string());
            TransferReport {
                status: "failed".to_string(),
                summary: None,
                error: Some(error.to_string()),
                events: lines,
            }
        }
    };

    Ok(Json(report))
}

/// Keep the health endpoint's `last_error` current once a streamed
/// transfer ends
fn record_outcome(last_error: Arc<RwLock<Option<String>>>, outcome: JoinHandle<TransferOutcome>) {
    tokio::spawn(async move {
        let message = match outcome.await {
            Ok(TransferOutcome::Completed {
                write_error: None, ..
            }) => None,
            Ok(TransferOutcome::Completed {
                write_error: Some(e),
                ..
            }) => Some(e.to_string()),
            Ok(TransferOutcome::Failed { error, .. }) => Some(error.to_string()),
            Err(e) => Some(format!("Transfer task failed: {}", e)),
        };
        if let Some(message) = message {
            *last_error.write().await = Some(message);
        }
    });
}

/// Build transfer routes
pub fn transfer_routes() -> Router<AppState> {
    Router::new()
        .route("/transfer", post(run_transfer))
        .route("/transfer/events", get(transfer_event_stream))
}
