//! YouTube Data API client (source catalog)
//!
//! Reads playlist item titles via `playlistItems.list`. The API returns at
//! most 50 items per request, so several requests may be needed to fill
//! the caller's limit; reading stops as soon as the limit is reached.
//! A 404 on the first request means the playlist has no report. On a later
//! request it is an error, so a partial list is never passed off as whole.

use async_trait::async_trait;
use governor::DefaultDirectRateLimiter;
use serde::Deserialize;
use tracing::{debug, info};

use super::{http_client, rate_limiter, status_error, SourceCatalog, SourceEntry, SourcePlaylist};
use crate::error::CatalogError;
use tunebridge_common::config::SourceConfig;

/// Items per request accepted by the service
const MAX_PAGE_SIZE: usize = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsResponse {
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    items: Vec<PlaylistItem>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    #[serde(default)]
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: Option<String>,
}

/// YouTube Data API v3 client
pub struct YouTubeClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    rate_limiter: DefaultDirectRateLimiter,
}

impl YouTubeClient {
    pub fn new(
        api_key: String,
        base_url: String,
        requests_per_second: u32,
    ) -> Result<Self, CatalogError> {
        Ok(Self {
            http_client: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            rate_limiter: rate_limiter(requests_per_second),
        })
    }

    /// Build from the `[source]` config section; an API key is required
    pub fn from_config(config: &SourceConfig) -> Result<Self, CatalogError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                CatalogError::MissingCredentials(
                    "source API key not configured (source.api_key or TUNEBRIDGE_SOURCE_API_KEY)"
                        .to_string(),
                )
            })?;
        Self::new(api_key, config.base_url.clone(), config.requests_per_second)
    }

    async fn fetch_page(
        &self,
        playlist_id: &str,
        max_results: usize,
        page_token: Option<&str>,
    ) -> Result<Option<PlaylistItemsResponse>, CatalogError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/playlistItems", self.base_url);
        let max_results = max_results.to_string();
        let mut query = vec![
            ("part", "snippet"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
            ("key", self.api_key.as_str()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        debug!(playlist_id = %playlist_id, "Querying source playlist items");

        let response = self
            .http_client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let page = response
            .json::<PlaylistItemsResponse>()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;
        Ok(Some(page))
    }
}

#[async_trait]
impl SourceCatalog for YouTubeClient {
    async fn get_playlist(
        &self,
        playlist_id: &str,
        limit: usize,
    ) -> Result<Option<SourcePlaylist>, CatalogError> {
        let mut tracks = Vec::new();
        let mut page_token: Option<String> = None;

        while tracks.len() < limit {
            let wanted = (limit - tracks.len()).min(MAX_PAGE_SIZE);
            let page = match self
                .fetch_page(playlist_id, wanted, page_token.as_deref())
                .await?
            {
                Some(page) => page,
                None if tracks.is_empty() => return Ok(None),
                None => {
                    return Err(CatalogError::NotFound(format!(
                        "playlist {} disappeared after {} items",
                        playlist_id,
                        tracks.len()
                    )))
                }
            };

            tracks.extend(page.items.into_iter().take(wanted).map(|item| SourceEntry {
                title: item.snippet.and_then(|s| s.title),
            }));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        info!(
            playlist_id = %playlist_id,
            tracks = tracks.len(),
            "Read source playlist"
        );
        Ok(Some(SourcePlaylist { tracks }))
    }
}
