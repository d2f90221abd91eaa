//! Error types for the domain layer.

use thiserror::Error;

/// Invalid value object input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// The value was empty or whitespace only
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Transport-level failures.
///
/// None of these reach callers of the connection manager; they drive the
/// reconnect state machine and are logged.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint URL or handshake request could not be built
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The connection attempt failed
    #[error("Connection error: {0}")]
    Connect(String),

    /// The link is closed and can no longer carry frames
    #[error("Link closed")]
    LinkClosed,

    /// An outbound frame could not be encoded
    #[error("Frame encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Offline queue persistence failures
#[derive(Debug, Error)]
pub enum QueueError {
    /// Reading or writing the backing file failed
    #[error("Queue I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file could not be encoded or decoded
    #[error("Queue serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
