//! Parsing of lines typed at the prompt.

use thiserror::Error;

use crate::domain::{MessageId, RoomId};

/// What a line typed at the prompt asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// Plain text message
    Say(String),
    /// `/file <url>`
    File(String),
    /// `/reply <id> <text>`
    Reply { message_id: MessageId, text: String },
    /// `/room <id>`
    Room(RoomId),
    /// `/typing`: keystroke activity without sending
    Typing,
    /// `/help`
    Help,
    /// `/quit`
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Unknown command '/{0}', try /help")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

pub const HELP: &str = "\
Commands:
  <text>              send a message
  /file <url>         send a file link
  /reply <id> <text>  reply to a message
  /room <id>          switch rooms
  /typing             announce that you are typing
  /quit               exit";

/// Parse one non-empty line. A leading `//` escapes a literal slash.
pub fn parse_input(line: &str) -> Result<InputCommand, InputError> {
    let line = line.trim();
    if let Some(escaped) = line.strip_prefix("//") {
        return Ok(InputCommand::Say(format!("/{}", escaped)));
    }
    let Some(command) = line.strip_prefix('/') else {
        return Ok(InputCommand::Say(line.to_string()));
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };
    match name {
        "file" if !rest.is_empty() => Ok(InputCommand::File(rest.to_string())),
        "file" => Err(InputError::Usage("/file <url>")),
        "reply" => {
            let (id, text) = rest
                .split_once(char::is_whitespace)
                .ok_or(InputError::Usage("/reply <id> <text>"))?;
            let message_id =
                MessageId::new(id).map_err(|_| InputError::Usage("/reply <id> <text>"))?;
            Ok(InputCommand::Reply {
                message_id,
                text: text.trim().to_string(),
            })
        }
        "room" => RoomId::new(rest)
            .map(InputCommand::Room)
            .map_err(|_| InputError::Usage("/room <id>")),
        "typing" => Ok(InputCommand::Typing),
        "help" => Ok(InputCommand::Help),
        "quit" | "exit" => Ok(InputCommand::Quit),
        other => Err(InputError::UnknownCommand(other.to_string())),
    }
}
