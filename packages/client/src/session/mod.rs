//! Connection manager: one live connection for the active room.
//!
//! [`ConnectionManager`] is a cheap command handle; all state lives in a single
//! driver task that processes commands, connect outcomes, inbound frames and
//! the reconnect timer strictly one at a time.

mod driver;
mod manager;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{ChatState, Credential, UserId};

pub use manager::{ConnectionManager, ConnectionManagerBuilder};

/// Chat state shared between the driver and the UI
pub type SharedChatState = Arc<Mutex<ChatState>>;

/// The local user as established by the authentication collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user: UserId,
    /// Session cookie attached to every connection attempt
    pub credential: Option<Credential>,
}

impl Identity {
    pub fn new(user: UserId, credential: Option<Credential>) -> Self {
        Self { user, credential }
    }
}
