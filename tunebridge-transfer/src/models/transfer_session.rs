//! Transfer workflow state machine
//!
//! A transfer moves forward through six states:
//! INIT → RESOLVING_IDS → FETCHING_SOURCE → MATCHING → WRITING → COMPLETE
//!
//! FAILED is reachable from any non-terminal state. An empty source
//! playlist jumps from FETCHING_SOURCE straight to COMPLETE. Nothing ever
//! moves backward, so each state is visited at most once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::InvalidTransition;
use tunebridge_common::TransferSummary;

/// Transfer workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferState {
    Init,
    /// Both playlist URLs parsed into identifiers
    ResolvingIds,
    /// Source track list being read
    FetchingSource,
    /// One destination search per source track
    Matching,
    /// Matched ids appended in batches
    Writing,
    Complete,
    Failed,
}

impl TransferState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Complete | TransferState::Failed)
    }

    pub fn can_transition_to(&self, next: TransferState) -> bool {
        use TransferState::*;
        match (*self, next) {
            (s, Failed) => !s.is_terminal(),
            (Init, ResolvingIds)
            | (ResolvingIds, FetchingSource)
            | (FetchingSource, Matching)
            | (FetchingSource, Complete)
            | (Matching, Writing)
            | (Writing, Complete) => true,
            _ => false,
        }
    }
}

/// Recorded state change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub transfer_id: Uuid,
    pub old_state: TransferState,
    pub new_state: TransferState,
    pub transitioned_at: DateTime<Utc>,
}

/// In-memory record of one transfer invocation
#[derive(Debug, Clone, Serialize)]
pub struct TransferSession {
    pub transfer_id: Uuid,
    pub state: TransferState,
    pub summary: TransferSummary,
    pub transitions: Vec<StateTransition>,
    pub started_at: DateTime<Utc>,
    /// Set once a terminal state is reached
    pub ended_at: Option<DateTime<Utc>>,
}

impl TransferSession {
    pub fn new() -> Self {
        Self {
            transfer_id: Uuid::new_v4(),
            state: TransferState::Init,
            summary: TransferSummary::default(),
            transitions: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Move to `new_state`, rejecting backward or skipped transitions
    pub fn transition_to(
        &mut self,
        new_state: TransferState,
    ) -> Result<StateTransition, InvalidTransition> {
        if !self.state.can_transition_to(new_state) {
            return Err(InvalidTransition {
                from: self.state,
                to: new_state,
            });
        }

        debug!(
            transfer_id = %self.transfer_id,
            "Transfer state {:?} -> {:?}", self.state, new_state
        );

        let transition = StateTransition {
            transfer_id: self.transfer_id,
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };
        self.transitions.push(transition.clone());
        self.state = new_state;

        if new_state.is_terminal() {
            self.ended_at = Some(transition.transitioned_at);
        }

        Ok(transition)
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

impl Default for TransferSession {
    fn default() -> Self {
        Self::new()
    }
}
