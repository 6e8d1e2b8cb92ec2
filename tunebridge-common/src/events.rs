//! Transfer progress events
//!
//! Every event serializes to a single line `<kind>:<payload>`. A `complete`
//! event ends the stream; nothing follows it.
//!
//! Events travel from the producing transfer task to its consumer over a
//! bounded single-producer channel, so consumers observe them in exactly
//! the order they were emitted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Event category, the part of the line before the first `:`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Info,
    Success,
    Warning,
    Error,
    Complete,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Info => "info",
            EventKind::Success => "success",
            EventKind::Warning => "warning",
            EventKind::Error => "error",
            EventKind::Complete => "complete",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(EventKind::Info),
            "success" => Ok(EventKind::Success),
            "warning" => Ok(EventKind::Warning),
            "error" => Ok(EventKind::Error),
            "complete" => Ok(EventKind::Complete),
            other => Err(crate::Error::InvalidInput(format!("Unknown event kind: {}", other))),
        }
    }
}

/// One progress message produced during a transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum ProgressEvent {
    Info(String),
    Success(String),
    Warning(String),
    Error(String),
    /// End of stream; payload is usually empty
    Complete(String),
}

impl ProgressEvent {
    pub fn info(message: impl Into<String>) -> Self {
        ProgressEvent::Info(message.into())
    }

    pub fn success(message: impl Into<String>) -> Self {
        ProgressEvent::Success(message.into())
    }

    pub fn warning(message: impl Into<String>) -> Self {
        ProgressEvent::Warning(message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        ProgressEvent::Error(message.into())
    }

    pub fn complete() -> Self {
        ProgressEvent::Complete(String::new())
    }

    pub fn new(kind: EventKind, payload: impl Into<String>) -> Self {
        let payload = payload.into();
        match kind {
            EventKind::Info => ProgressEvent::Info(payload),
            EventKind::Success => ProgressEvent::Success(payload),
            EventKind::Warning => ProgressEvent::Warning(payload),
            EventKind::Error => ProgressEvent::Error(payload),
            EventKind::Complete => ProgressEvent::Complete(payload),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            ProgressEvent::Info(_) => EventKind::Info,
            ProgressEvent::Success(_) => EventKind::Success,
            ProgressEvent::Warning(_) => EventKind::Warning,
            ProgressEvent::Error(_) => EventKind::Error,
            ProgressEvent::Complete(_) => EventKind::Complete,
        }
    }

    pub fn payload(&self) -> &str {
        match self {
            ProgressEvent::Info(p)
            | ProgressEvent::Success(p)
            | ProgressEvent::Warning(p)
            | ProgressEvent::Error(p)
            | ProgressEvent::Complete(p) => p,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, ProgressEvent::Complete(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ProgressEvent::Error(_))
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.payload())
    }
}

impl FromStr for ProgressEvent {
    type Err = crate::Error;

    /// Parse a `<kind>:<payload>` line. The payload may itself contain `:`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (kind, payload) = line
            .split_once(':')
            .ok_or_else(|| {
                crate::Error::InvalidInput(format!("Missing ':' in event line: {}", line))
            })?;
        Ok(ProgressEvent::new(kind.parse()?, payload))
    }
}

/// Running totals for one transfer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSummary {
    /// Tracks read from the source playlist
    pub total_source: usize,
    /// Tracks appended to the destination playlist
    pub added_count: usize,
    /// Tracks without a title or without a destination match
    pub skipped_count: usize,
}

/// The receiving side of the progress channel has been dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("progress consumer disconnected")]
pub struct ConsumerGone;

/// Producer half of the progress channel
///
/// Sending waits while the channel is full, which paces the transfer to
/// the consumer.
#[derive(Debug)]
pub struct ProgressSink {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ProgressSink {
    pub fn new(tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self { tx }
    }

    /// Create a sink together with its receiver
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Send one event, mirroring it to the log
    pub async fn emit(&self, event: ProgressEvent) -> Result<(), ConsumerGone> {
        match &event {
            ProgressEvent::Error(msg) => error!("{}", msg),
            ProgressEvent::Warning(msg) => warn!("{}", msg),
            ProgressEvent::Info(msg) | ProgressEvent::Success(msg) => info!("{}", msg),
            ProgressEvent::Complete(_) => debug!("Progress stream complete"),
        }
        self.tx.send(event).await.map_err(|_| ConsumerGone)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
