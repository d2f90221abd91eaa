//! Client configuration.
//!
//! Built from command-line arguments by the binary; every field has a default
//! so tests and embedders can start from [`ClientConfig::default`].

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{BackoffPolicy, FlushPolicy, TypingDebouncer};

/// Default chat server base URL
pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL; the room connection is `{server_url}/rooms/{room}/ws`
    pub server_url: String,
    /// Delay between reconnect attempts
    pub backoff: BackoffPolicy,
    /// Keystroke inactivity after which STOP is announced
    pub typing_idle: Duration,
    /// Where to persist the offline queue; in-memory when `None`
    pub queue_path: Option<PathBuf>,
    /// What to do with queued entries for other rooms on flush
    pub flush_policy: FlushPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            backoff: BackoffPolicy::default(),
            typing_idle: TypingDebouncer::DEFAULT_IDLE,
            queue_path: None,
            flush_policy: FlushPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into();
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_typing_idle(mut self, typing_idle: Duration) -> Self {
        self.typing_idle = typing_idle;
        self
    }

    pub fn with_flush_policy(mut self, flush_policy: FlushPolicy) -> Self {
        self.flush_policy = flush_policy;
        self
    }

    pub fn with_queue_path(mut self, queue_path: impl Into<PathBuf>) -> Self {
        self.queue_path = Some(queue_path.into());
        self
    }
}
