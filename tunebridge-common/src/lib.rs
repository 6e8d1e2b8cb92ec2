//! # tunebridge common library
//!
//! Shared code for the tunebridge crates:
//! - Progress event type and channel (`events`)
//! - SSE relay for progress streams (`sse`)
//! - Configuration loading (`config`)
//! - Logging setup (`logging`)

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod sse;

pub use error::{Error, Result};
pub use events::{ConsumerGone, EventKind, ProgressEvent, ProgressSink, TransferSummary};
