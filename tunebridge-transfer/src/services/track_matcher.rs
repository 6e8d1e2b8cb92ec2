//! Title-based track matching against the destination catalog
//!
//! One search per title, first result wins. There is no scoring and no
//! fuzzy comparison: the destination's own ranking decides.
//!
//! A failed search never escapes this module. It becomes
//! `MatchResult::Unmatched` carrying the error text, so one bad lookup
//! cannot stop the transfer.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::clients::{DestinationCatalog, ResultType};

pub const REASON_NO_TITLE: &str = "no title";
pub const REASON_NO_MATCH: &str = "no match found";

/// Outcome of matching one source track
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MatchResult {
    Matched {
        destination_track_id: String,
        destination_track_name: String,
    },
    Unmatched {
        reason: String,
    },
}

impl MatchResult {
    fn unmatched(reason: impl Into<String>) -> Self {
        MatchResult::Unmatched {
            reason: reason.into(),
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }
}

pub struct TrackMatcher {
    destination: Arc<dyn DestinationCatalog>,
}

impl TrackMatcher {
    pub fn new(destination: Arc<dyn DestinationCatalog>) -> Self {
        Self { destination }
    }

    /// Find the destination track for `title`
    ///
    /// A missing or blank title is answered without calling the catalog.
    pub async fn match_title(&self, title: Option<&str>) -> MatchResult {
        let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) else {
            return MatchResult::unmatched(REASON_NO_TITLE);
        };

        match self.destination.search(title, ResultType::Track, 1).await {
            Ok(results) => match results.into_iter().next() {
                Some(track) => {
                    debug!(title = %title, id = %track.id, "Destination match");
                    MatchResult::Matched {
                        destination_track_id: track.id,
                        destination_track_name: track.name,
                    }
                }
                None => MatchResult::unmatched(REASON_NO_MATCH),
            },
            Err(e) => {
                warn!(title = %title, "Destination search failed: {}", e);
                MatchResult::unmatched(e.to_string())
            }
        }
    }
}
