//! Error types for tunebridge-transfer
//!
//! Failures split into two groups:
//! - structural (`InvalidUrlError`, `FetchError`, `WriteError`): fatal to the
//!   transfer, surfaced as an `error` event
//! - per-track (`CatalogError` returned by a search): folded into
//!   `MatchResult::Unmatched` and never interrupts the track loop

use crate::models::{Platform, TransferState};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tunebridge_common::ConsumerGone;

/// Remote catalog call failure (shared by both service clients)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Batch of {size} items exceeds the limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
}

/// Destination search failure. Never fatal: the matcher folds it into
/// `MatchResult::Unmatched`.
pub type SearchFailure = CatalogError;

/// Destination append failure, wrapped into [`WriteError`] by the batch writer
pub type WriteFailure = CatalogError;

/// Playlist URL could not be turned into an identifier
///
/// Raised before any remote call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidUrlError {
    #[error("Invalid destination playlist URL '{0}'. Make sure it's a playlist link.")]
    MissingPlaylistSegment(String),

    #[error("Invalid source playlist URL '{0}'. It should contain 'list='.")]
    MissingListParameter(String),

    #[error("Invalid {platform} playlist URL '{url}'. The playlist id is empty.")]
    EmptyId { platform: Platform, url: String },
}

/// Source playlist could not be read
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to fetch source playlist {playlist_id}: {source}")]
pub struct FetchError {
    pub playlist_id: String,
    #[source]
    pub source: CatalogError,
}

/// Destination append failed; later batches were not attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("batch {batch_number} failed after {added} tracks were added: {source}")]
pub struct WriteError {
    /// Tracks committed by earlier batches
    pub added: usize,
    /// 1-based number of the failing batch
    pub batch_number: usize,
    #[source]
    pub source: CatalogError,
}

/// State machine asked to move somewhere it may not go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid transfer state transition: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: TransferState,
    pub to: TransferState,
}

/// Reason a transfer stopped without a `complete` event
#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    InvalidUrl(#[from] InvalidUrlError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    ConsumerGone(#[from] ConsumerGone),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
