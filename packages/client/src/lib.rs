//! Realtime chat client core.
//!
//! Maintains one live WebSocket connection per chat room, reconnects with
//! exponential backoff, queues outbound messages while disconnected and folds
//! inbound protocol events into local message/typing state.

// layers
pub mod domain;
pub mod infrastructure;
pub mod session;
pub mod ui;

pub mod config;
pub mod error;
