//! Transfer pipeline services
//!
//! Leaf-first:
//! - `resolver`: playlist URL → identifier
//! - `source_reader`: source playlist → ordered tracks
//! - `track_matcher`: title → destination track
//! - `batch_writer`: matched ids → destination playlist
//! - `transfer_orchestrator`: sequences the above and emits progress

pub mod batch_writer;
pub mod resolver;
pub mod source_reader;
pub mod track_matcher;
pub mod transfer_orchestrator;

pub use batch_writer::BatchWriter;
pub use resolver::resolve;
pub use source_reader::SourceReader;
pub use track_matcher::{MatchResult, TrackMatcher};
pub use transfer_orchestrator::{
    TransferHandle, TransferOptions, TransferOrchestrator, TransferOutcome, TransferRequest,
};
