//! Test Helper Utilities
//!
//! In-memory catalogs that record every call, for driving the transfer
//! pipeline without network access

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tunebridge_common::ProgressEvent;
use tunebridge_transfer::clients::{
    CatalogTrack, DestinationCatalog, ResultType, SourceCatalog, SourceEntry, SourcePlaylist,
};
use tunebridge_transfer::error::{CatalogError, SearchFailure, WriteFailure};
use tunebridge_transfer::services::{
    TransferOptions, TransferOrchestrator, TransferOutcome, TransferRequest,
};

pub const SOURCE_URL: &str = "https://music.youtube.com/playlist?list=PLsource123&si=abc";
pub const DESTINATION_URL: &str = "https://open.spotify.com/playlist/dest456?si=xyz";

/// Source catalog with a fixed answer
pub struct FakeSource {
    response: Result<Option<SourcePlaylist>, CatalogError>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl FakeSource {
    /// Playlist whose entries carry these titles (`""` is an untitled entry)
    pub fn with_titles(titles: &[&str]) -> Self {
        let tracks = titles
            .iter()
            .map(|t| SourceEntry {
                title: if t.is_empty() { None } else { Some(t.to_string()) },
            })
            .collect();
        Self::with_response(Ok(Some(SourcePlaylist { tracks })))
    }

    /// Service reports nothing for the playlist
    pub fn without_report() -> Self {
        Self::with_response(Ok(None))
    }

    pub fn failing(error: CatalogError) -> Self {
        Self::with_response(Err(error))
    }

    fn with_response(response: Result<Option<SourcePlaylist>, CatalogError>) -> Self {
        Self {
            response,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(playlist_id, limit)` of every call
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceCatalog for FakeSource {
    async fn get_playlist(
        &self,
        playlist_id: &str,
        limit: usize,
    ) -> Result<Option<SourcePlaylist>, CatalogError> {
        self.calls
            .lock()
            .unwrap()
            .push((playlist_id.to_string(), limit));
        self.response.clone()
    }
}

/// Destination catalog keyed by exact query text
#[derive(Default)]
pub struct FakeDestination {
    tracks: HashMap<String, CatalogTrack>,
    failing_queries: Vec<String>,
    /// 1-based append call that fails
    fail_add_on_call: Option<usize>,
    searches: Mutex<Vec<String>>,
    adds: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` with a track whose id is `id` and name is the query
    pub fn with_track(mut self, query: &str, id: &str) -> Self {
        self.tracks.insert(
            query.to_string(),
            CatalogTrack {
                id: id.to_string(),
                name: query.to_string(),
            },
        );
        self
    }

    /// Make searches for `query` fail
    pub fn with_failing_search(mut self, query: &str) -> Self {
        self.failing_queries.push(query.to_string());
        self
    }

    pub fn failing_add_on_call(mut self, call: usize) -> Self {
        self.fail_add_on_call = Some(call);
        self
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    /// `(playlist_id, ids)` of every append call, including a failing one
    pub fn adds(&self) -> Vec<(String, Vec<String>)> {
        self.adds.lock().unwrap().clone()
    }
}

#[async_trait]
impl DestinationCatalog for FakeDestination {
    async fn search(
        &self,
        query: &str,
        _result_type: ResultType,
        limit: usize,
    ) -> Result<Vec<CatalogTrack>, SearchFailure> {
        self.searches.lock().unwrap().push(query.to_string());
        if self.failing_queries.iter().any(|q| q == query) {
            return Err(CatalogError::Network("connection reset".to_string()));
        }
        Ok(self
            .tracks
            .get(query)
            .cloned()
            .into_iter()
            .take(limit)
            .collect())
    }

    async fn add_items(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), WriteFailure> {
        let call = {
            let mut adds = self.adds.lock().unwrap();
            adds.push((playlist_id.to_string(), track_ids.to_vec()));
            adds.len()
        };
        if self.fail_add_on_call == Some(call) {
            return Err(CatalogError::Api {
                status: 403,
                message: "Forbidden".to_string(),
            });
        }
        Ok(())
    }
}

pub fn orchestrator(
    source: Arc<FakeSource>,
    destination: Arc<FakeDestination>,
    options: TransferOptions,
) -> TransferOrchestrator {
    TransferOrchestrator::new(source, destination, options)
}

/// Run a transfer to the end, collecting every event
pub async fn run_to_end(
    orchestrator: &TransferOrchestrator,
    source_url: &str,
    destination_url: &str,
) -> (Vec<ProgressEvent>, TransferOutcome) {
    let mut handle = orchestrator.spawn(TransferRequest::new(source_url, destination_url));
    let mut events = Vec::new();
    while let Some(event) = handle.events.recv().await {
        events.push(event);
    }
    let outcome = handle.outcome.await.expect("transfer task panicked");
    (events, outcome)
}

/// Event lines in `kind:payload` form
pub fn lines(events: &[ProgressEvent]) -> Vec<String> {
    events.iter().map(|e| e.to_string()).collect()
}
