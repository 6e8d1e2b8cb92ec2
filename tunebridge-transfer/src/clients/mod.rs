//! Remote catalog clients
//!
//! The pipeline only sees the two traits below. Handles are created once,
//! already authenticated, and shared read-only for the whole transfer.
//!
//! - [`SourceCatalog`]: reads a playlist's track titles
//! - [`DestinationCatalog`]: searches tracks and appends to a playlist

pub mod spotify;
pub mod youtube;

pub use spotify::SpotifyClient;
pub use youtube::YouTubeClient;

use crate::error::{CatalogError, SearchFailure, WriteFailure};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::StatusCode;
use serde::Deserialize;
use std::num::NonZeroU32;

/// Kind of catalog item a search should return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    Track,
}

impl ResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultType::Track => "track",
        }
    }
}

/// Destination search hit
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogTrack {
    pub id: String,
    pub name: String,
}

/// Source playlist entry as reported by the service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceEntry {
    pub title: Option<String>,
}

/// Source playlist contents, in playlist order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePlaylist {
    pub tracks: Vec<SourceEntry>,
}

/// Read access to the source service
#[async_trait]
pub trait SourceCatalog: Send + Sync {
    /// Fetch at most `limit` entries of a playlist
    ///
    /// `Ok(None)` means the service has no report for this playlist.
    async fn get_playlist(
        &self,
        playlist_id: &str,
        limit: usize,
    ) -> Result<Option<SourcePlaylist>, CatalogError>;
}

/// Search and write access to the destination service
#[async_trait]
pub trait DestinationCatalog: Send + Sync {
    /// Search the catalog, best match first
    async fn search(
        &self,
        query: &str,
        result_type: ResultType,
        limit: usize,
    ) -> Result<Vec<CatalogTrack>, SearchFailure>;

    /// Append `track_ids` to the end of a playlist, keeping their order
    async fn add_items(&self, playlist_id: &str, track_ids: &[String])
        -> Result<(), WriteFailure>;
}

/// Token bucket allowing `requests_per_second` calls per second
pub(crate) fn rate_limiter(requests_per_second: u32) -> DefaultDirectRateLimiter {
    let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    RateLimiter::direct(Quota::per_second(rate))
}

/// Map a non-success response to a [`CatalogError`]
pub(crate) async fn status_error(response: reqwest::Response) -> CatalogError {
    let status = response.status();
    let retry_after_secs = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let message = response.text().await.unwrap_or_default();

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CatalogError::Unauthorized(message),
        StatusCode::NOT_FOUND => CatalogError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => CatalogError::RateLimited { retry_after_secs },
        _ => CatalogError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Shared HTTP client settings for both services
pub(crate) fn http_client() -> Result<reqwest::Client, CatalogError> {
    reqwest::Client::builder()
        .user_agent(concat!("tunebridge/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(30))
        .connect_timeout(std::time::Duration::from_secs(5))
        .build()
        .map_err(|e| CatalogError::Network(e.to_string()))
}
