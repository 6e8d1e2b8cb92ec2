//! Server-Sent Events (SSE) utilities
//!
//! Forwards a progress channel to an SSE response. Each event becomes one
//! `data:` frame carrying the `<kind>:<payload>` line, sent as soon as the
//! producer emits it. The response ends when the producer drops its sink.
//!
//! Payloads may carry outside text (URLs, track titles, service error
//! bodies). Any CR or CRLF is folded into LF, which axum writes as extra
//! `data:` lines of the same frame.

use crate::events::ProgressEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Build an SSE response that relays `rx` until the channel closes
pub fn progress_sse_stream(
    mut rx: mpsc::Receiver<ProgressEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = async_stream::stream! {
        info!("SSE: progress stream started");

        while let Some(event) = rx.recv().await {
            debug!("SSE: forwarding {}", event.kind());
            yield Ok(event_frame(&event));
        }

        info!("SSE: progress stream finished");
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}

/// A one-frame SSE response, used to report a request that never started
/// a transfer
pub fn single_event_sse(
    event: ProgressEvent,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = futures::stream::once(async move { Ok(event_frame(&event)) });
    Sse::new(stream)
}

fn event_frame(event: &ProgressEvent) -> Event {
    Event::default().data(frame_data(event))
}

/// Event line with every line break normalised to `\n`
pub fn frame_data(event: &ProgressEvent) -> String {
    event.to_string().replace("\r\n", "\n").replace('\r', "\n")
}
