//! Playlist URL resolution
//!
//! Pure string parsing: no network access, no state. The same URL always
//! resolves to the same identifier.

use crate::error::InvalidUrlError;
use crate::models::Platform;

const PLAYLIST_SEGMENT: &str = "playlist";
const LIST_PARAMETER: &str = "list=";

/// Extract the playlist identifier from `url`
///
/// - Destination: the URL path must contain a literal `playlist` segment;
///   the identifier is the last segment without its `?...` suffix.
/// - Source: the URL must contain `list=`; the identifier runs from the
///   last `list=` up to the next `&` or the end of the string.
pub fn resolve(url: &str, platform: Platform) -> Result<String, InvalidUrlError> {
    let id = match platform {
        Platform::Destination => resolve_destination(url)?,
        Platform::Source => resolve_source(url)?,
    };

    if id.is_empty() {
        return Err(InvalidUrlError::EmptyId {
            platform,
            url: url.to_string(),
        });
    }
    Ok(id.to_string())
}

fn resolve_destination(url: &str) -> Result<&str, InvalidUrlError> {
    let segments: Vec<&str> = url.split('/').collect();
    if !segments.contains(&PLAYLIST_SEGMENT) {
        return Err(InvalidUrlError::MissingPlaylistSegment(url.to_string()));
    }

    let last = segments.last().copied().unwrap_or_default();
    Ok(last.split('?').next().unwrap_or_default())
}

fn resolve_source(url: &str) -> Result<&str, InvalidUrlError> {
    if !url.contains(LIST_PARAMETER) {
        return Err(InvalidUrlError::MissingListParameter(url.to_string()));
    }

    let tail = url.rsplit(LIST_PARAMETER).next().unwrap_or_default();
    Ok(tail.split('&').next().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_plain() {
        assert_eq!(
            resolve(
                "https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M",
                Platform::Destination
            )
            .unwrap(),
            "37i9dQZF1DXcBWIGoYBM5M"
        );
    }

    #[test]
    fn test_destination_strips_query() {
        assert_eq!(
            resolve(
                "https://open.spotify.com/playlist/37i9dQZF1DXcBWIGoYBM5M?si=1a2b3c&pt=x",
                Platform::Destination
            )
            .unwrap(),
            "37i9dQZF1DXcBWIGoYBM5M"
        );
    }

    #[test]
    fn test_destination_with_locale_prefix() {
        assert_eq!(
            resolve(
                "https://open.spotify.com/intl-de/playlist/abc123?si=zz",
                Platform::Destination
            )
            .unwrap(),
            "abc123"
        );
    }

    #[test]
    fn test_destination_requires_playlist_segment() {
        let err = resolve("https://open.spotify.com/album/abc123", Platform::Destination)
            .unwrap_err();
        assert!(matches!(err, InvalidUrlError::MissingPlaylistSegment(_)));

        // "playlist" must be a whole segment, not a substring
        assert!(resolve("https://open.spotify.com/playlists/abc", Platform::Destination).is_err());
    }

    #[test]
    fn test_destination_empty_id() {
        let err = resolve("https://open.spotify.com/playlist/", Platform::Destination).unwrap_err();
        assert!(matches!(err, InvalidUrlError::EmptyId { .. }));

        let err = resolve("https://open.spotify.com/playlist/?si=abc", Platform::Destination)
            .unwrap_err();
        assert!(matches!(err, InvalidUrlError::EmptyId { .. }));
    }

    #[test]
    fn test_source_with_trailing_parameters() {
        assert_eq!(
            resolve(
                "https://music.youtube.com/playlist?list=PLabc123&si=xyz",
                Platform::Source
            )
            .unwrap(),
            "PLabc123"
        );
    }

    #[test]
    fn test_source_list_last() {
        assert_eq!(
            resolve("https://music.youtube.com/playlist?list=PLabc123", Platform::Source).unwrap(),
            "PLabc123"
        );
    }

    #[test]
    fn test_source_watch_url() {
        assert_eq!(
            resolve(
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=RDdQw4&index=2",
                Platform::Source
            )
            .unwrap(),
            "RDdQw4"
        );
    }

    #[test]
    fn test_source_requires_list_parameter() {
        let err = resolve("https://music.youtube.com/watch?v=abc", Platform::Source).unwrap_err();
        assert!(matches!(err, InvalidUrlError::MissingListParameter(_)));
    }

    #[test]
    fn test_source_empty_id() {
        assert!(matches!(
            resolve("https://music.youtube.com/playlist?list=&si=1", Platform::Source),
            Err(InvalidUrlError::EmptyId { platform: Platform::Source, .. })
        ));
    }

    #[test]
    fn test_platforms_are_not_interchangeable() {
        let source_url = "https://music.youtube.com/playlist?list=PL1";
        assert!(resolve(source_url, Platform::Destination).is_err());
        assert!(resolve("https://open.spotify.com/playlist/abc", Platform::Source).is_err());
    }

    #[test]
    fn test_idempotent() {
        let url = "https://open.spotify.com/playlist/abc?si=1";
        let first = resolve(url, Platform::Destination).unwrap();
        for _ in 0..3 {
            assert_eq!(resolve(url, Platform::Destination).unwrap(), first);
        }
    }
}
