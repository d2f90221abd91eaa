//! The connection manager's event loop.

use std::ops::ControlFlow;
use std::pin::Pin;
use std::sync::Arc;

use roomlink_shared::time::Clock;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Sleep;

use crate::domain::{
    ChatUpdate, ConnectionAction, ConnectionMachine, ConnectionState, Connector, Endpoint,
    FlushPolicy, Link, OutboundPayload, OutboundQueue, QueueEntry, RoomId, TransportError,
};
use crate::infrastructure::dto::{WireFrame, decode_inbound};

use super::{Identity, SharedChatState};

/// Requests from the handle
#[derive(Debug)]
pub(crate) enum Command {
    SelectRoom(Option<RoomId>),
    Send(OutboundPayload),
    SendTyping(bool),
    Shutdown,
}

/// Result of a connect attempt, tagged with the session it belongs to
struct ConnectOutcome {
    epoch: u64,
    result: Result<Link, TransportError>,
}

pub(crate) struct Driver {
    identity: Identity,
    server_url: String,
    flush_policy: FlushPolicy,
    connector: Arc<dyn Connector>,
    queue: Box<dyn OutboundQueue>,
    chat: SharedChatState,
    clock: Arc<dyn Clock>,

    machine: ConnectionMachine,
    room: Option<RoomId>,
    /// Bumped on every teardown; outcomes from older sessions are discarded
    epoch: u64,
    link: Option<Link>,
    pending_connect: Option<JoinHandle<()>>,
    reconnect_timer: Option<Pin<Box<Sleep>>>,

    commands: mpsc::UnboundedReceiver<Command>,
    outcomes_tx: mpsc::UnboundedSender<ConnectOutcome>,
    outcomes_rx: mpsc::UnboundedReceiver<ConnectOutcome>,
    state_tx: watch::Sender<ConnectionState>,
    updates_tx: broadcast::Sender<ChatUpdate>,
}

pub(crate) struct DriverParts {
    pub identity: Identity,
    pub server_url: String,
    pub flush_policy: FlushPolicy,
    pub machine: ConnectionMachine,
    pub connector: Arc<dyn Connector>,
    pub queue: Box<dyn OutboundQueue>,
    pub chat: SharedChatState,
    pub clock: Arc<dyn Clock>,
    pub commands: mpsc::UnboundedReceiver<Command>,
    pub state_tx: watch::Sender<ConnectionState>,
    pub updates_tx: broadcast::Sender<ChatUpdate>,
}

async fn next_frame(link: &mut Option<Link>) -> Option<String> {
    match link {
        Some(link) => link.recv().await,
        None => std::future::pending().await,
    }
}

async fn reconnect_due(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

fn transmit(link: &Link, frame: &WireFrame) -> Result<(), TransportError> {
    link.send(frame.to_json()?)
}

impl Driver {
    pub(crate) fn new(parts: DriverParts) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        Self {
            identity: parts.identity,
            server_url: parts.server_url,
            flush_policy: parts.flush_policy,
            connector: parts.connector,
            queue: parts.queue,
            chat: parts.chat,
            clock: parts.clock,
            machine: parts.machine,
            room: None,
            epoch: 0,
            link: None,
            pending_connect: None,
            reconnect_timer: None,
            commands: parts.commands,
            outcomes_tx,
            outcomes_rx,
            state_tx: parts.state_tx,
            updates_tx: parts.updates_tx,
        }
    }

    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    if self.handle_command(command).is_break() {
                        break;
                    }
                }
                Some(outcome) = self.outcomes_rx.recv() => self.handle_connect_outcome(outcome),
                frame = next_frame(&mut self.link) => match frame {
                    Some(text) => self.handle_frame(&text).await,
                    None => self.handle_link_closed(),
                },
                () = reconnect_due(&mut self.reconnect_timer) => self.handle_reconnect_due(),
            }
        }
        self.teardown();
        tracing::debug!("Connection manager for '{}' stopped", self.identity.user);
    }

    fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::SelectRoom(room) => self.select_room(room),
            Command::Send(payload) => self.send(payload),
            Command::SendTyping(is_typing) => self.send_typing(is_typing),
            Command::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn select_room(&mut self, room: Option<RoomId>) {
        if room == self.room && self.machine.state() != ConnectionState::Idle {
            return;
        }
        self.teardown();
        self.room = room;
        if self.room.is_some()
            && let Some(action) = self.machine.start()
        {
            self.execute(action);
        }
        self.publish_state();
    }

    /// Cancel the timer and any connect attempt, detach and close the link.
    fn teardown(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.reconnect_timer = None;
        if let Some(task) = self.pending_connect.take() {
            task.abort();
        }
        if let Some(link) = self.link.take() {
            link.close();
        }
        if let Some(room) = &self.room
            && self.machine.state() != ConnectionState::Idle
        {
            tracing::info!("Leaving room '{}'", room);
        }
        self.machine.teardown();
        self.publish_state();
    }

    fn execute(&mut self, action: ConnectionAction) {
        match action {
            ConnectionAction::Connect => self.begin_connect(),
            ConnectionAction::FlushQueue => self.flush_queue(),
            ConnectionAction::ScheduleReconnect { attempt, delay } => {
                tracing::info!(
                    "Reconnecting in {} ms (attempt {})",
                    delay.as_millis(),
                    attempt + 1
                );
                self.reconnect_timer = Some(Box::pin(tokio::time::sleep(delay)));
            }
        }
    }

    fn begin_connect(&mut self) {
        let Some(room) = self.room.clone() else {
            return;
        };
        let endpoint = Endpoint {
            server_url: self.server_url.clone(),
            room,
            credential: self.identity.credential.clone(),
        };
        tracing::info!(
            "Attempting to connect to {} as '{}'",
            endpoint.url(),
            self.identity.user
        );

        let connector = Arc::clone(&self.connector);
        let outcomes = self.outcomes_tx.clone();
        let epoch = self.epoch;
        self.pending_connect = Some(tokio::spawn(async move {
            let result = connector.connect(&endpoint).await;
            let _ = outcomes.send(ConnectOutcome { epoch, result });
        }));
    }

    fn handle_connect_outcome(&mut self, outcome: ConnectOutcome) {
        if outcome.epoch != self.epoch {
            if let Ok(link) = outcome.result {
                link.close();
            }
            return;
        }
        self.pending_connect = None;

        let action = match outcome.result {
            Ok(link) => {
                self.link = Some(link);
                if let Some(room) = &self.room {
                    tracing::info!("Connected to room '{}'", room);
                }
                self.machine.opened()
            }
            Err(e) => {
                tracing::warn!("Connection attempt failed: {}", e);
                self.machine.closed()
            }
        };
        self.publish_state();
        if let Some(action) = action {
            self.execute(action);
        }
        self.publish_state();
    }

    fn handle_link_closed(&mut self) {
        self.link = None;
        if let Some(room) = &self.room {
            tracing::warn!("Connection to room '{}' lost", room);
        }
        if let Some(action) = self.machine.closed() {
            self.execute(action);
        }
        self.publish_state();
    }

    fn handle_reconnect_due(&mut self) {
        self.reconnect_timer = None;
        if let Some(action) = self.machine.timer_elapsed() {
            self.execute(action);
        }
        self.publish_state();
    }

    async fn handle_frame(&mut self, text: &str) {
        let Some(room) = self.room.clone() else {
            return;
        };
        let event = match decode_inbound(text) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!("Dropping inbound frame: {}", e);
                return;
            }
        };
        let now = self.clock.now();
        let updates = self
            .chat
            .lock()
            .await
            .apply_inbound(&room, &self.identity.user, event, now);
        for update in updates {
            // No subscribers is fine
            let _ = self.updates_tx.send(update);
        }
    }

    fn send(&mut self, payload: OutboundPayload) {
        if self.machine.state().is_open()
            && let Some(link) = &self.link
        {
            match transmit(link, &WireFrame::from(&payload)) {
                Ok(()) => return,
                Err(e) => tracing::warn!("Failed to send message, queueing it: {}", e),
            }
        }
        self.enqueue(payload);
    }

    fn enqueue(&mut self, payload: OutboundPayload) {
        let room = self
            .room
            .clone()
            .unwrap_or_else(|| payload.room_id.clone());
        tracing::debug!("Queueing message for room '{}' until connected", room);
        if let Err(e) = self.queue.enqueue(QueueEntry::new(room, payload)) {
            tracing::warn!("Failed to persist offline queue: {}", e);
        }
    }

    fn send_typing(&mut self, is_typing: bool) {
        let (Some(link), Some(room)) = (&self.link, &self.room) else {
            tracing::trace!("Dropping typing signal while disconnected");
            return;
        };
        if !self.machine.state().is_open() {
            return;
        }
        let frame = WireFrame::typing(&self.identity.user, room, is_typing);
        if let Err(e) = transmit(link, &frame) {
            tracing::debug!("Failed to send typing signal: {}", e);
        }
    }

    /// Transmit queued entries for the active room in enqueue order.
    fn flush_queue(&mut self) {
        let Some(room) = self.room.clone() else {
            return;
        };
        let flushed = match self.queue.flush(&|entry| entry.room == room) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to read offline queue: {}", e);
                return;
            }
        };
        if self.flush_policy == FlushPolicy::DropOtherRooms {
            match self.queue.flush(&|_| true) {
                Ok(dropped) if !dropped.is_empty() => tracing::warn!(
                    "Dropped {} queued message(s) for other rooms",
                    dropped.len()
                ),
                Ok(_) => {}
                Err(e) => tracing::warn!("Failed to drop stale queue entries: {}", e),
            }
        }
        if flushed.is_empty() {
            return;
        }

        tracing::info!(
            "Flushing {} queued message(s) to room '{}'",
            flushed.len(),
            room
        );
        let mut pending = flushed.into_iter();
        while let Some(entry) = pending.next() {
            let result = match &self.link {
                Some(link) => transmit(link, &WireFrame::from(&entry.payload)),
                None => Err(TransportError::LinkClosed),
            };
            if let Err(e) = result {
                tracing::warn!("Flush interrupted, re-queueing the rest: {}", e);
                let rest: Vec<_> = std::iter::once(entry).chain(pending.by_ref()).collect();
                if let Err(e) = self.queue.requeue_front(rest) {
                    tracing::warn!("Failed to persist offline queue: {}", e);
                }
                return;
            }
        }
    }

    fn publish_state(&self) {
        let state = self.machine.state();
        self.state_tx.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
    }
}
