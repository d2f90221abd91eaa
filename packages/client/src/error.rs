//! Error types for the chat client application.

use thiserror::Error;

use crate::domain::{QueueError, ValueObjectError};

/// Client-specific errors surfaced at the application boundary.
///
/// The connection manager itself never fails: transport errors end in a
/// reconnect. These come from setup and the terminal front end.
#[derive(Debug, Error)]
pub enum ClientError {
    /// An identifier given on the command line is invalid
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ValueObjectError),

    /// The offline queue could not be opened
    #[error("Offline queue error: {0}")]
    Queue(#[from] QueueError),

    /// The line editor failed to start
    #[error("Terminal error: {0}")]
    Terminal(String),
}
