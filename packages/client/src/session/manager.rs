//! Public handle on the connection manager.

use std::sync::Arc;

use roomlink_shared::time::{Clock, SystemClock};
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::domain::{
    ChatState, ChatUpdate, ConnectionMachine, ConnectionState, Connector, OutboundPayload,
    OutboundQueue, RoomId,
};
use crate::infrastructure::queue::InMemoryOutboundQueue;

use super::driver::{Command, Driver, DriverParts};
use super::{Identity, SharedChatState};

const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// Handle on a running connection manager.
///
/// Every method returns immediately; the work happens on the driver task.
/// Dropping the handle tears the session down like [`ConnectionManager::shutdown`].
pub struct ConnectionManager {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
    updates: broadcast::Sender<ChatUpdate>,
    chat: SharedChatState,
    task: JoinHandle<()>,
}

/// Collects the collaborators of a [`ConnectionManager`]
pub struct ConnectionManagerBuilder {
    config: ClientConfig,
    identity: Identity,
    connector: Arc<dyn Connector>,
    queue: Option<Box<dyn OutboundQueue>>,
    chat: Option<SharedChatState>,
    clock: Option<Arc<dyn Clock>>,
}

impl ConnectionManagerBuilder {
    /// Offline queue to use; in-memory when not set
    pub fn queue(mut self, queue: impl OutboundQueue + 'static) -> Self {
        self.queue = Some(Box::new(queue));
        self
    }

    /// Boxed variant of [`Self::queue`]
    pub fn boxed_queue(mut self, queue: Box<dyn OutboundQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Chat state to fold inbound events into; a fresh one when not set
    pub fn chat(mut self, chat: SharedChatState) -> Self {
        self.chat = Some(chat);
        self
    }

    /// Wall clock for timestamps; [`SystemClock`] when not set
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Start the driver task in `Idle`. Must be called inside a tokio runtime.
    pub fn spawn(self) -> ConnectionManager {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);
        let (updates_tx, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        let chat = self
            .chat
            .unwrap_or_else(|| Arc::new(Mutex::new(ChatState::new())));

        let driver = Driver::new(DriverParts {
            identity: self.identity,
            server_url: self.config.server_url,
            flush_policy: self.config.flush_policy,
            machine: ConnectionMachine::new(self.config.backoff),
            connector: self.connector,
            queue: self
                .queue
                .unwrap_or_else(|| Box::new(InMemoryOutboundQueue::new())),
            chat: Arc::clone(&chat),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            commands: commands_rx,
            state_tx,
            updates_tx: updates_tx.clone(),
        });

        ConnectionManager {
            commands: commands_tx,
            state: state_rx,
            updates: updates_tx,
            chat,
            task: tokio::spawn(driver.run()),
        }
    }
}

impl ConnectionManager {
    pub fn builder(
        config: ClientConfig,
        identity: Identity,
        connector: Arc<dyn Connector>,
    ) -> ConnectionManagerBuilder {
        ConnectionManagerBuilder {
            config,
            identity,
            connector,
            queue: None,
            chat: None,
            clock: None,
        }
    }

    fn command(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::warn!("Connection manager is no longer running");
        }
    }

    /// Make `room` the active room, replacing the current connection.
    ///
    /// Selecting the already active room is a no-op; `None` disconnects.
    pub fn select_room(&self, room: Option<RoomId>) {
        self.command(Command::SelectRoom(room));
    }

    /// Send now if connected, otherwise queue for the next open. Never fails.
    pub fn send(&self, payload: OutboundPayload) {
        self.command(Command::Send(payload));
    }

    /// Announce typing START/STOP. Dropped unless connected.
    pub fn send_typing(&self, is_typing: bool) {
        self.command(Command::SendTyping(is_typing));
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Receiver notified on every state change
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Receiver of changes applied to the chat state
    pub fn subscribe(&self) -> broadcast::Receiver<ChatUpdate> {
        self.updates.subscribe()
    }

    pub fn chat(&self) -> SharedChatState {
        Arc::clone(&self.chat)
    }

    /// Tear down the connection and wait for the driver to stop
    pub async fn shutdown(self) {
        self.command(Command::Shutdown);
        if let Err(e) = self.task.await
            && e.is_panic()
        {
            tracing::error!("Connection manager task panicked: {}", e);
        }
    }
}
