//! Batched playlist appends
//!
//! Track ids are split into contiguous chunks of at most `batch_size` and
//! appended one chunk at a time, in order. The first failing chunk stops
//! the write: later chunks are not attempted and the error reports how
//! many tracks earlier chunks committed.

use std::sync::Arc;
use tracing::{debug, info};

use crate::clients::DestinationCatalog;
use crate::error::WriteError;
use tunebridge_common::config::MAX_BATCH_SIZE;
use tunebridge_common::{ProgressEvent, ProgressSink};

pub struct BatchWriter {
    destination: Arc<dyn DestinationCatalog>,
    batch_size: usize,
}

impl BatchWriter {
    pub fn new(destination: Arc<dyn DestinationCatalog>, batch_size: usize) -> Self {
        Self {
            destination,
            batch_size: batch_size.max(1),
        }
    }

    pub fn with_default_batch_size(destination: Arc<dyn DestinationCatalog>) -> Self {
        Self::new(destination, MAX_BATCH_SIZE)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Append `track_ids` to `playlist_id`, returning the number added
    ///
    /// When `sink` is given, an `info` event is emitted after each committed
    /// chunk. A disconnected consumer does not interrupt the write.
    pub async fn add_in_batches(
        &self,
        playlist_id: &str,
        track_ids: &[String],
        sink: Option<&ProgressSink>,
    ) -> Result<usize, WriteError> {
        let mut added = 0;

        for (index, chunk) in track_ids.chunks(self.batch_size).enumerate() {
            self.destination
                .add_items(playlist_id, chunk)
                .await
                .map_err(|source| WriteError {
                    added,
                    batch_number: index + 1,
                    source,
                })?;

            added += chunk.len();
            info!(
                playlist_id = %playlist_id,
                batch = index + 1,
                size = chunk.len(),
                "Committed batch"
            );

            if let Some(sink) = sink {
                let event = ProgressEvent::info(format!("Added batch of {} tracks.", chunk.len()));
                if sink.emit(event).await.is_err() {
                    debug!("Progress consumer gone, continuing write");
                }
            }
        }

        Ok(added)
    }
}
