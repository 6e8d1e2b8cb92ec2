//! HTTP API handlers for tunebridge
//!
//! REST + SSE surface over the transfer pipeline.

pub mod health;
pub mod transfer;

pub use health::health_routes;
pub use transfer::transfer_routes;
