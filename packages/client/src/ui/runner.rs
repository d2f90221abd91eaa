//! Client execution logic: wires the line editor to the connection manager.

use std::ops::ControlFlow;
use std::sync::Arc;

use chrono::{FixedOffset, Local};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::Instant;

use crate::config::ClientConfig;
use crate::domain::{
    ChatUpdate, ConnectionState, OutboundPayload, OutboundQueue, RoomId, TypingDebouncer,
    TypingSignal,
};
use crate::error::ClientError;
use crate::infrastructure::queue::{FileOutboundQueue, InMemoryOutboundQueue};
use crate::infrastructure::transport::WebSocketConnector;
use crate::session::{ConnectionManager, Identity};

use super::command::{HELP, InputCommand, parse_input};
use super::formatter::MessageFormatter;
use super::prompt::{prompt_text, redisplay_prompt};

/// Run the interactive client until `/quit`, Ctrl+C or Ctrl+D
pub async fn run_client(
    config: ClientConfig,
    identity: Identity,
    room: RoomId,
) -> Result<(), ClientError> {
    let queue: Box<dyn OutboundQueue> = match &config.queue_path {
        Some(path) => {
            let queue = FileOutboundQueue::open(path)?;
            tracing::info!(
                "Offline queue at {} ({} pending)",
                queue.path().display(),
                queue.len()
            );
            Box::new(queue)
        }
        None => Box::new(InMemoryOutboundQueue::new()),
    };
    let debouncer = TypingDebouncer::new(config.typing_idle);
    let manager =
        ConnectionManager::builder(config, identity.clone(), Arc::new(WebSocketConnector::new()))
            .boxed_queue(queue)
            .spawn();

    let (prompt_tx, prompt_rx) = watch::channel(prompt_text(&identity.user, &room));
    let mut input_rx = spawn_line_reader(prompt_rx).await?;

    println!(
        "\nYou are '{}'. Type messages and press Enter to send. /help lists commands.\n",
        identity.user
    );
    manager.select_room(Some(room.clone()));

    let mut terminal = Terminal {
        updates: manager.subscribe(),
        state: manager.watch_state(),
        manager,
        identity,
        room,
        debouncer,
        prompt_tx,
        offset: *Local::now().offset(),
    };

    loop {
        tokio::select! {
            line = input_rx.recv() => {
                let Some(line) = line else { break };
                if terminal.handle_line(&line).await.is_break() {
                    break;
                }
            }
            update = terminal.updates.recv() => match update {
                Ok(update) => terminal.render_update(update).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Display fell behind, skipped {} update(s)", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            changed = terminal.state.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *terminal.state.borrow_and_update();
                terminal.render_state(state).await;
            }
            () = typing_due(terminal.debouncer.deadline()) => {
                if let Some(signal) = terminal.debouncer.poll_expired(Instant::now()) {
                    terminal.announce(signal);
                }
            }
        }
    }

    if let Some(signal) = terminal.debouncer.on_send() {
        terminal.announce(signal);
    }
    terminal.manager.shutdown().await;
    tracing::info!("Client session ended normally");
    Ok(())
}

async fn typing_due(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Spawn a blocking thread for rustyline (synchronous readline).
///
/// Resolves once the editor is initialized; the returned channel closes when
/// the user hits Ctrl+C or Ctrl+D.
async fn spawn_line_reader(
    prompt: watch::Receiver<String>,
) -> Result<mpsc::UnboundedReceiver<String>, ClientError> {
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let (ready_tx, ready_rx) = oneshot::channel();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => {
                let _ = ready_tx.send(Ok(()));
                rl
            }
            Err(e) => {
                let _ = ready_tx.send(Err(e.to_string()));
                return;
            }
        };

        loop {
            let current = prompt.borrow().clone();
            match rl.readline(&current) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    match ready_rx.await {
        Ok(Ok(())) => Ok(input_rx),
        Ok(Err(e)) => Err(ClientError::Terminal(e)),
        Err(_) => Err(ClientError::Terminal(
            "line editor thread exited".to_string(),
        )),
    }
}

struct Terminal {
    manager: ConnectionManager,
    updates: broadcast::Receiver<ChatUpdate>,
    state: watch::Receiver<ConnectionState>,
    identity: Identity,
    room: RoomId,
    debouncer: TypingDebouncer,
    prompt_tx: watch::Sender<String>,
    offset: FixedOffset,
}

impl Terminal {
    async fn handle_line(&mut self, line: &str) -> ControlFlow<()> {
        let command = match parse_input(line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                return ControlFlow::Continue(());
            }
        };

        match command {
            InputCommand::Say(text) => {
                self.send(OutboundPayload::text(
                    self.identity.user.clone(),
                    self.room.clone(),
                    text,
                ));
            }
            InputCommand::File(url) => {
                self.send(OutboundPayload::file(
                    self.identity.user.clone(),
                    self.room.clone(),
                    url,
                ));
            }
            InputCommand::Reply { message_id, text } => {
                let target = {
                    let chat = self.manager.chat();
                    let chat = chat.lock().await;
                    chat.messages(&self.room)
                        .iter()
                        .rev()
                        .find(|message| message.id == message_id)
                        .cloned()
                };
                match target {
                    Some(target) => self.send(
                        OutboundPayload::text(self.identity.user.clone(), self.room.clone(), text)
                            .replying_to(&target),
                    ),
                    None => println!("No message with id '{}' in this room", message_id),
                }
            }
            InputCommand::Room(room) => {
                if let Some(signal) = self.debouncer.on_send() {
                    self.announce(signal);
                }
                self.prompt_tx
                    .send_replace(prompt_text(&self.identity.user, &room));
                self.room = room.clone();
                self.manager.select_room(Some(room));
            }
            InputCommand::Typing => {
                if let Some(signal) = self.debouncer.on_keystroke(Instant::now()) {
                    self.announce(signal);
                }
            }
            InputCommand::Help => println!("{}", HELP),
            InputCommand::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn send(&mut self, payload: OutboundPayload) {
        if let Some(signal) = self.debouncer.on_send() {
            self.announce(signal);
        }
        self.manager.send(payload);
        print!(
            "{}",
            MessageFormatter::format_sent_confirmation(self.manager.state())
        );
    }

    fn announce(&self, signal: TypingSignal) {
        self.manager.send_typing(signal.is_typing());
    }

    async fn render_update(&self, update: ChatUpdate) {
        let output = match update {
            ChatUpdate::MessageAppended { room, message } if room == self.room => {
                Some(MessageFormatter::format_chat_message(&message, &self.offset))
            }
            ChatUpdate::MessageEdited { room, message_id } if room == self.room => {
                let chat = self.manager.chat();
                let chat = chat.lock().await;
                chat.messages(&room)
                    .iter()
                    .find(|message| message.id == message_id)
                    .map(|message| MessageFormatter::format_edited(message, &self.offset))
            }
            ChatUpdate::MessageDeleted { room, message_id } if room == self.room => {
                Some(MessageFormatter::format_deleted(&message_id))
            }
            ChatUpdate::TypingChanged { room, users } if room == self.room => {
                MessageFormatter::format_typing(&users)
            }
            _ => None,
        };
        if let Some(output) = output {
            print!("{}", output);
            redisplay_prompt(&self.prompt_tx.borrow());
        }
    }

    async fn render_state(&self, state: ConnectionState) {
        let mut output = MessageFormatter::format_connection_state(state, &self.room);
        if state.is_open() {
            let chat = self.manager.chat();
            let chat = chat.lock().await;
            output.push_str(&MessageFormatter::format_room_joined(
                &self.room,
                chat.messages(&self.room),
                &self.offset,
            ));
        }
        print!("{}", output);
        redisplay_prompt(&self.prompt_tx.borrow());
    }
}
