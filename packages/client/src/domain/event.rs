//! Decoded inbound protocol events.

use chrono::{DateTime, Utc};

use super::message::{Message, ReplyRef};
use super::value_object::{MessageId, RoomId, UserId};

/// A message as announced by the peer, before it is placed in a room log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// `None` when the frame carried neither `_id` nor `message_id`
    pub id: Option<MessageId>,
    pub author: UserId,
    pub display_name: Option<String>,
    pub body: String,
    pub is_file: bool,
    /// `None` when absent or unparsable
    pub created_at: Option<DateTime<Utc>>,
    pub reply: Option<ReplyRef>,
}

impl IncomingMessage {
    /// Materialize the message for `room`, filling gaps from `now`
    pub fn into_message(self, room: &RoomId, now: DateTime<Utc>) -> Message {
        Message {
            id: self.id.unwrap_or_else(MessageId::placeholder),
            room_id: room.clone(),
            author: self.author,
            display_name: self.display_name,
            file_url: self.is_file.then(|| self.body.clone()),
            body: self.body,
            created_at: self.created_at.unwrap_or(now),
            updated_at: None,
            edited: false,
            deleted: false,
            reply: self.reply,
        }
    }
}

/// One validated inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// `MSG` or `MSG_FILE`
    Message(IncomingMessage),
    /// `MSG_EDIT`
    Edited { message_id: MessageId, body: String },
    /// `MSG_DELETE`
    Deleted { message_id: MessageId },
    /// `TYPING_START`
    TypingStarted { author: UserId },
    /// `TYPING_STOP`
    TypingStopped { author: UserId },
}
