//! Source playlist reader
//!
//! Reads at most `page_limit` tracks. Anything past the limit is never
//! requested; longer playlists are transferred partially.

use std::sync::Arc;
use tracing::{debug, info};

use crate::clients::SourceCatalog;
use crate::error::FetchError;
use crate::models::SourceTrack;

/// Default number of tracks read from a source playlist
pub const DEFAULT_PAGE_LIMIT: usize = 100;

pub struct SourceReader {
    source: Arc<dyn SourceCatalog>,
    page_limit: usize,
}

impl SourceReader {
    pub fn new(source: Arc<dyn SourceCatalog>, page_limit: usize) -> Self {
        Self {
            source,
            page_limit: page_limit.max(1),
        }
    }

    pub fn page_limit(&self) -> usize {
        self.page_limit
    }

    /// Fetch the ordered track list of `playlist_id`
    ///
    /// An absent playlist report yields an empty list, not an error.
    pub async fn fetch_tracks(&self, playlist_id: &str) -> Result<Vec<SourceTrack>, FetchError> {
        debug!(playlist_id = %playlist_id, limit = self.page_limit, "Fetching source tracks");

        let playlist = self
            .source
            .get_playlist(playlist_id, self.page_limit)
            .await
            .map_err(|source| FetchError {
                playlist_id: playlist_id.to_string(),
                source,
            })?;

        let Some(playlist) = playlist else {
            info!(playlist_id = %playlist_id, "Source returned no playlist report");
            return Ok(Vec::new());
        };

        Ok(playlist
            .tracks
            .into_iter()
            .take(self.page_limit)
            .enumerate()
            .map(|(index, entry)| SourceTrack {
                title: entry.title,
                position: index + 1,
            })
            .collect())
    }
}
