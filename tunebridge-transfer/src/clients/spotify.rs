//! Spotify Web API client (destination catalog)
//!
//! Uses a bearer token obtained elsewhere. Token refresh is not handled
//! here: an expired token surfaces as `CatalogError::Unauthorized`.

use async_trait::async_trait;
use governor::DefaultDirectRateLimiter;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    http_client, rate_limiter, status_error, CatalogTrack, DestinationCatalog, ResultType,
};
use crate::error::{CatalogError, SearchFailure, WriteFailure};
use tunebridge_common::config::{DestinationConfig, MAX_BATCH_SIZE};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    tracks: Option<TrackPage>,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<CatalogTrack>,
}

#[derive(Debug, Serialize)]
struct AddItemsRequest {
    uris: Vec<String>,
}

/// Spotify Web API client
pub struct SpotifyClient {
    http_client: reqwest::Client,
    base_url: String,
    access_token: String,
    rate_limiter: DefaultDirectRateLimiter,
}

impl SpotifyClient {
    pub fn new(
        access_token: String,
        base_url: String,
        requests_per_second: u32,
    ) -> Result<Self, CatalogError> {
        Ok(Self {
            http_client: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
            rate_limiter: rate_limiter(requests_per_second),
        })
    }

    /// Build from the `[destination]` config section; a token is required
    pub fn from_config(config: &DestinationConfig) -> Result<Self, CatalogError> {
        let token = config
            .access_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                CatalogError::MissingCredentials(
                    "destination access token not configured (destination.access_token or TUNEBRIDGE_DESTINATION_TOKEN)"
                        .to_string(),
                )
            })?;
        Self::new(token, config.base_url.clone(), config.requests_per_second)
    }

    fn track_uri(track_id: &str) -> String {
        if track_id.starts_with("spotify:") {
            track_id.to_string()
        } else {
            format!("spotify:track:{}", track_id)
        }
    }
}

#[async_trait]
impl DestinationCatalog for SpotifyClient {
    async fn search(
        &self,
        query: &str,
        result_type: ResultType,
        limit: usize,
    ) -> Result<Vec<CatalogTrack>, SearchFailure> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/search", self.base_url);
        let limit = limit.to_string();

        debug!(query = %query, "Searching destination catalog");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", query),
                ("type", result_type.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body = response
            .json::<SearchResponse>()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;

        Ok(body.tracks.map(|page| page.items).unwrap_or_default())
    }

    async fn add_items(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), WriteFailure> {
        if track_ids.len() > MAX_BATCH_SIZE {
            return Err(CatalogError::BatchTooLarge {
                size: track_ids.len(),
                limit: MAX_BATCH_SIZE,
            });
        }

        self.rate_limiter.until_ready().await;

        let url = format!("{}/playlists/{}/tracks", self.base_url, playlist_id);
        let body = AddItemsRequest {
            uris: track_ids.iter().map(|id| Self::track_uri(id)).collect(),
        };

        debug!(
            playlist_id = %playlist_id,
            count = track_ids.len(),
            "Appending to destination playlist"
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(())
    }
}
