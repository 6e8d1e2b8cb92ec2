//! Playlist and track models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::InvalidUrlError;
use crate::services::resolver;

/// Which side of a transfer a playlist URL belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Playlist tracks are read from here (YouTube Music)
    Source,
    /// Matched tracks are appended here (Spotify)
    Destination,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Source => f.write_str("source"),
            Platform::Destination => f.write_str("destination"),
        }
    }
}

impl FromStr for Platform {
    type Err = tunebridge_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "source" | "ytmusic" | "youtube" => Ok(Platform::Source),
            "destination" | "spotify" => Ok(Platform::Destination),
            other => Err(tunebridge_common::Error::InvalidInput(format!(
                "Unknown platform: {}",
                other
            ))),
        }
    }
}

/// A playlist URL together with the identifier extracted from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistRef {
    pub platform: Platform,
    pub raw_url: String,
    /// Never empty
    pub id: String,
}

impl PlaylistRef {
    pub fn parse(url: &str, platform: Platform) -> Result<Self, InvalidUrlError> {
        let id = resolver::resolve(url, platform)?;
        Ok(Self {
            platform,
            raw_url: url.to_string(),
            id,
        })
    }
}

/// One entry of the source playlist, in source order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceTrack {
    pub title: Option<String>,
    /// 1-based position within the source playlist
    pub position: usize,
}

impl SourceTrack {
    /// Title usable as a search query, if any
    pub fn searchable_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}
