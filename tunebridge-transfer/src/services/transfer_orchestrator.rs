//! Transfer orchestration
//!
//! Drives one transfer through the state machine in
//! [`crate::models::transfer_session`], emitting progress events as it
//! goes:
//!
//! 1. Resolve both playlist URLs (no remote call yet)
//! 2. Read the source track list
//! 3. Search the destination once per track, in source order
//! 4. Append all matches in batches
//! 5. Emit the summary and the terminal `complete` event
//!
//! Bad URLs and unreadable sources end the stream with an `error` event
//! and no `complete`. A failed write is reported with an `error` event but
//! the stream still completes, carrying the partial count.
//!
//! Everything runs sequentially on one task. Events go through a bounded
//! channel, so a slow consumer pauses the transfer between remote calls.

use futures::stream::Stream;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::batch_writer::BatchWriter;
use super::source_reader::{SourceReader, DEFAULT_PAGE_LIMIT};
use super::track_matcher::{MatchResult, TrackMatcher};
use crate::clients::{DestinationCatalog, SourceCatalog};
use crate::error::{TransferError, WriteError};
use crate::models::{Platform, PlaylistRef, TransferSession, TransferState};
use tunebridge_common::config::{TomlConfig, MAX_BATCH_SIZE};
use tunebridge_common::{ProgressEvent, ProgressSink, TransferSummary};

pub const NO_TRACKS_MESSAGE: &str = "No tracks found in the source playlist or playlist is empty.";

/// Playlist pair to transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub source_url: String,
    pub destination_url: String,
}

impl TransferRequest {
    pub fn new(source_url: impl Into<String>, destination_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            destination_url: destination_url.into(),
        }
    }
}

/// Tunables for one orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    /// Most tracks read from the source playlist
    pub page_limit: usize,
    /// Track ids per destination append call
    pub batch_size: usize,
    /// Capacity of the progress channel used by [`TransferOrchestrator::spawn`]
    pub event_buffer: usize,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            page_limit: DEFAULT_PAGE_LIMIT,
            batch_size: MAX_BATCH_SIZE,
            event_buffer: 16,
        }
    }
}

impl TransferOptions {
    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            page_limit: config.source.page_limit,
            batch_size: config.transfer.batch_size,
            event_buffer: config.transfer.event_buffer,
        }
    }
}

/// How a transfer ended
#[derive(Debug)]
pub enum TransferOutcome {
    /// Stream ended with `complete`; `write_error` is set if appending
    /// stopped early
    Completed {
        summary: TransferSummary,
        write_error: Option<WriteError>,
    },
    /// Stream ended without `complete`
    Failed {
        /// State the transfer was in when it stopped
        state: TransferState,
        error: TransferError,
    },
}

impl TransferOutcome {
    pub fn summary(&self) -> Option<&TransferSummary> {
        match self {
            TransferOutcome::Completed { summary, .. } => Some(summary),
            TransferOutcome::Failed { .. } => None,
        }
    }

    /// Completed with every batch written
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            TransferOutcome::Completed {
                write_error: None,
                ..
            }
        )
    }
}

/// A transfer running on its own task
pub struct TransferHandle {
    /// Progress events, in emission order; closes when the transfer ends
    pub events: mpsc::Receiver<ProgressEvent>,
    pub outcome: JoinHandle<TransferOutcome>,
}

/// Runs transfers between one source and one destination catalog
#[derive(Clone)]
pub struct TransferOrchestrator {
    source: Arc<dyn SourceCatalog>,
    destination: Arc<dyn DestinationCatalog>,
    options: TransferOptions,
}

impl TransferOrchestrator {
    pub fn new(
        source: Arc<dyn SourceCatalog>,
        destination: Arc<dyn DestinationCatalog>,
        options: TransferOptions,
    ) -> Self {
        Self {
            source,
            destination,
            options,
        }
    }

    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    /// Start a transfer on a new task
    pub fn spawn(&self, request: TransferRequest) -> TransferHandle {
        let (sink, events) = ProgressSink::channel(self.options.event_buffer);
        let orchestrator = self.clone();
        let outcome = tokio::spawn(async move { orchestrator.run(&request, &sink).await });
        TransferHandle { events, outcome }
    }

    /// Start a transfer and expose only its event stream
    pub fn stream(
        &self,
        request: TransferRequest,
    ) -> impl Stream<Item = ProgressEvent> + Send + 'static {
        let TransferHandle { mut events, .. } = self.spawn(request);
        async_stream::stream! {
            while let Some(event) = events.recv().await {
                yield event;
            }
        }
    }

    /// Run one transfer to the end, emitting progress into `sink`
    pub async fn run(&self, request: &TransferRequest, sink: &ProgressSink) -> TransferOutcome {
        let mut session = TransferSession::new();
        info!(transfer_id = %session.transfer_id, "Transfer started");

        match self.drive(&mut session, request, sink).await {
            Ok(write_error) => {
                info!(
                    transfer_id = %session.transfer_id,
                    total = session.summary.total_source,
                    added = session.summary.added_count,
                    skipped = session.summary.skipped_count,
                    "Transfer finished"
                );
                TransferOutcome::Completed {
                    summary: session.summary,
                    write_error,
                }
            }
            Err(error) => {
                let state = session.state;
                if !session.is_terminal() {
                    if let Err(e) = session.transition_to(TransferState::Failed) {
                        warn!("{}", e);
                    }
                }
                match &error {
                    TransferError::ConsumerGone(_) => warn!(
                        transfer_id = %session.transfer_id,
                        "Progress consumer disconnected during {:?}, transfer stopped", state
                    ),
                    _ => warn!(
                        transfer_id = %session.transfer_id,
                        "Transfer failed during {:?}: {}", state, error
                    ),
                }
                TransferOutcome::Failed { state, error }
            }
        }
    }

    async fn drive(
        &self,
        session: &mut TransferSession,
        request: &TransferRequest,
        sink: &ProgressSink,
    ) -> Result<Option<WriteError>, TransferError> {
        session.transition_to(TransferState::ResolvingIds)?;
        let resolved = PlaylistRef::parse(&request.source_url, Platform::Source).and_then(|source| {
            PlaylistRef::parse(&request.destination_url, Platform::Destination)
                .map(|destination| (source, destination))
        });
        let (source_ref, destination_ref) = match resolved {
            Ok(refs) => refs,
            Err(e) => {
                sink.emit(ProgressEvent::error(format!("Error extracting playlist ID: {}", e)))
                    .await?;
                return Err(e.into());
            }
        };
        debug!(source = %source_ref.id, destination = %destination_ref.id, "Resolved playlists");

        session.transition_to(TransferState::FetchingSource)?;
        let reader = SourceReader::new(self.source.clone(), self.options.page_limit);
        let tracks = match reader.fetch_tracks(&source_ref.id).await {
            Ok(tracks) => tracks,
            Err(e) => {
                sink.emit(ProgressEvent::error(format!("Error fetching playlist data: {}", e)))
                    .await?;
                return Err(e.into());
            }
        };

        if tracks.is_empty() {
            sink.emit(ProgressEvent::info(NO_TRACKS_MESSAGE)).await?;
            session.transition_to(TransferState::Complete)?;
            Self::emit_complete(sink).await;
            return Ok(None);
        }

        let total = tracks.len();
        session.summary.total_source = total;
        sink.emit(ProgressEvent::info(format!(
            "Attempting to transfer {} tracks from source to destination...",
            total
        )))
        .await?;

        session.transition_to(TransferState::Matching)?;
        let matcher = TrackMatcher::new(self.destination.clone());
        let mut matched_ids = Vec::new();

        for track in &tracks {
            let title = track.searchable_title();
            if let Some(title) = title {
                sink.emit(ProgressEvent::info(format!(
                    "Searching destination for '{}'...",
                    title
                )))
                .await?;
            }

            let event = match matcher.match_title(title).await {
                MatchResult::Matched {
                    destination_track_id,
                    destination_track_name,
                } => {
                    matched_ids.push(destination_track_id);
                    ProgressEvent::success(format!(
                        "Found match: '{}' (source: '{}')",
                        destination_track_name,
                        title.unwrap_or_default()
                    ))
                }
                MatchResult::Unmatched { reason } => {
                    session.summary.skipped_count += 1;
                    match title {
                        Some(title) => {
                            ProgressEvent::warning(format!("Skipped: '{}' ({})", title, reason))
                        }
                        None => ProgressEvent::warning(format!(
                            "Skipped track {}/{}: No title found for an entry.",
                            track.position, total
                        )),
                    }
                }
            };
            sink.emit(event).await?;
        }

        session.transition_to(TransferState::Writing)?;
        let mut write_error = None;

        if matched_ids.is_empty() {
            sink.emit(ProgressEvent::info("No tracks were found or matched for transfer."))
                .await?;
        } else {
            sink.emit(ProgressEvent::info(format!(
                "Adding {} matched tracks to destination playlist in batches...",
                matched_ids.len()
            )))
            .await?;

            let writer = BatchWriter::new(self.destination.clone(), self.options.batch_size);
            match writer
                .add_in_batches(&destination_ref.id, &matched_ids, Some(sink))
                .await
            {
                Ok(added) => {
                    session.summary.added_count = added;
                    sink.emit(ProgressEvent::success(format!(
                        "Successfully added {} tracks to destination playlist.",
                        added
                    )))
                    .await?;
                }
                Err(e) => {
                    session.summary.added_count = e.added;
                    sink.emit(ProgressEvent::error(format!(
                        "Error adding tracks to destination playlist: {}. Check playlist ID and permissions.",
                        e
                    )))
                    .await?;
                    write_error = Some(e);
                }
            }
        }

        sink.emit(ProgressEvent::info(format!(
            "Transfer process concluded. Added: {}, Skipped: {}.",
            session.summary.added_count, session.summary.skipped_count
        )))
        .await?;

        session.transition_to(TransferState::Complete)?;
        Self::emit_complete(sink).await;
        Ok(write_error)
    }

    /// The transfer is over either way; a vanished consumer only loses the
    /// terminal event
    async fn emit_complete(sink: &ProgressSink) {
        if sink.emit(ProgressEvent::complete()).await.is_err() {
            debug!("Progress consumer gone before completion event");
        }
    }
}
