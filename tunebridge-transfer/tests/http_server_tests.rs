//! HTTP Server & Routing Integration Tests
//!
//! Router-level tests via `tower::ServiceExt::oneshot`; no socket is bound.

mod helpers;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use helpers::{orchestrator, FakeDestination, FakeSource, DESTINATION_URL, SOURCE_URL};
use tunebridge_transfer::services::TransferOptions;
use tunebridge_transfer::{build_router, AppState};

fn test_app_state(source: FakeSource, destination: FakeDestination) -> AppState {
    AppState::new(orchestrator(
        Arc::new(source),
        Arc::new(destination),
        TransferOptions::default(),
    ))
}

fn default_state() -> AppState {
    test_app_state(
        FakeSource::with_titles(&["Song A", "", "Song C"]),
        FakeDestination::new().with_track("Song A", "trackA"),
    )
}

fn events_uri(source_url: &str, destination_url: &str) -> String {
    format!(
        "/transfer/events?source_url={}&destination_url={}",
        urlencode(source_url),
        urlencode(destination_url)
    )
}

fn urlencode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}

/// Event lines carried by the `data:` frames of an SSE body
fn sse_data_lines(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data).to_string())
        .collect()
}

/// One entry per SSE frame, its `data:` lines joined with `\n`
fn sse_frames(body: &str) -> Vec<String> {
    body.split("\n\n")
        .map(sse_data_lines)
        .filter(|lines| !lines.is_empty())
        .map(|lines| lines.join("\n"))
        .collect()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    // Given
    let app = build_router(default_state());

    // When: GET /health
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    // Then
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "tunebridge");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptime_seconds"].is_u64());
    assert!(body.get("last_error").is_none());
}

#[tokio::test]
async fn test_sse_missing_params_yields_single_error_frame() {
    let app = build_router(default_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/transfer/events?source_url=https%3A%2F%2Fmusic.youtube.com%2Fplaylist%3Flist%3DPL1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let lines = sse_data_lines(&body_string(response).await);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("error:Playlist URLs not provided"));
}

#[tokio::test]
async fn test_sse_streams_full_transfer() {
    let app = build_router(default_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri(events_uri(SOURCE_URL, DESTINATION_URL))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/event-stream"));

    let lines = sse_data_lines(&body_string(response).await);
    assert_eq!(
        lines.first().map(String::as_str),
        Some("info:Attempting to transfer 3 tracks from source to destination...")
    );
    assert!(lines.contains(&"success:Found match: 'Song A' (source: 'Song A')".to_string()));
    assert!(lines.contains(&"info:Transfer process concluded. Added: 1, Skipped: 2.".to_string()));
    assert_eq!(lines.last().map(String::as_str), Some("complete:"));
}

#[tokio::test]
async fn test_sse_invalid_url_ends_without_complete() {
    let app = build_router(default_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri(events_uri(SOURCE_URL, "https://open.spotify.com/album/xyz"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let lines = sse_data_lines(&body_string(response).await);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("error:Error extracting playlist ID: "));
}

#[tokio::test]
async fn test_sse_carriage_return_in_url_yields_error_frame() {
    let app = build_router(default_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri(events_uri("https://music.youtube.com/watch?v=a\rb", DESTINATION_URL))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(!body.contains('\r'));

    let frames = sse_frames(&body);
    assert_eq!(frames.len(), 1);
    assert!(frames[0].starts_with("error:Error extracting playlist ID: "));
    assert!(frames[0].contains("watch?v=a\nb"));
}

#[tokio::test]
async fn test_sse_carriage_return_in_title_keeps_streaming() {
    let app = build_router(test_app_state(
        FakeSource::with_titles(&["Bad\rTitle", "Song A"]),
        FakeDestination::new().with_track("Song A", "trackA"),
    ));

    let response = app
        .oneshot(
            Request::builder()
                .uri(events_uri(SOURCE_URL, DESTINATION_URL))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let frames = sse_frames(&body_string(response).await);
    assert!(frames.contains(&"info:Searching destination for 'Bad\nTitle'...".to_string()));
    assert!(frames.contains(&"info:Transfer process concluded. Added: 1, Skipped: 1.".to_string()));
    assert_eq!(frames.last().map(String::as_str), Some("complete:"));
}

#[tokio::test]
async fn test_post_transfer_returns_report() {
    let app = build_router(default_state());

    let request_body = serde_json::json!({
        "source_url": SOURCE_URL,
        "destination_url": DESTINATION_URL,
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/transfer")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(request_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "completed");
    assert_eq!(body["summary"]["total_source"], 3);
    assert_eq!(body["summary"]["added_count"], 1);
    assert_eq!(body["summary"]["skipped_count"], 2);

    let events = body["events"].as_array().unwrap();
    assert_eq!(events.last().and_then(Value::as_str), Some("complete:"));
}

#[tokio::test]
async fn test_post_transfer_failure_updates_health() {
    let state = test_app_state(
        FakeSource::failing(tunebridge_transfer::error::CatalogError::NotFound(
            "gone".to_string(),
        )),
        FakeDestination::new(),
    );
    let app = build_router(state.clone());

    let request_body = serde_json::json!({
        "source_url": SOURCE_URL,
        "destination_url": DESTINATION_URL,
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/transfer")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(request_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "failed");
    assert!(body.get("summary").is_none());
    assert_eq!(body["events"].as_array().map(Vec::len), Some(1));

    let health = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let health: Value = serde_json::from_str(&body_string(health).await).unwrap();
    assert!(health["last_error"]
        .as_str()
        .unwrap_or_default()
        .contains("PLsource123"));
}

#[tokio::test]
async fn test_post_transfer_rejects_blank_urls() {
    let app = build_router(default_state());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/transfer")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({ "source_url": " ", "destination_url": DESTINATION_URL })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}
