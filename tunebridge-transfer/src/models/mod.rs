//! Data models for tunebridge-transfer

pub mod playlist;
pub mod transfer_session;

pub use playlist::{Platform, PlaylistRef, SourceTrack};
pub use transfer_session::{StateTransition, TransferSession, TransferState};
