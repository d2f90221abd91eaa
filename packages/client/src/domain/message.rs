//! Chat message entities and outbound payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value_object::{MessageId, RoomId, UserId};

/// Body substituted for a deleted message
pub const MESSAGE_TOMBSTONE: &str = "This message has been deleted.";

/// Snapshot of the message being replied to, taken at reply time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyRef {
    /// Id of the target message
    pub message_id: MessageId,
    /// Author of the target message
    pub author: Option<UserId>,
    /// Body of the target message
    pub body: Option<String>,
}

impl ReplyRef {
    /// Snapshot `target` for a reply
    pub fn to_message(target: &Message) -> Self {
        Self {
            message_id: target.id.clone(),
            author: Some(target.author.clone()),
            body: Some(target.body.clone()),
        }
    }
}

/// A message in a room's log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub room_id: RoomId,
    pub author: UserId,
    pub display_name: Option<String>,
    /// Text, the file URL for file messages, or [`MESSAGE_TOMBSTONE`]
    pub body: String,
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub edited: bool,
    pub deleted: bool,
    pub reply: Option<ReplyRef>,
}

impl Message {
    /// A plain text message with no edit/delete history
    pub fn new(
        id: MessageId,
        room_id: RoomId,
        author: UserId,
        body: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            room_id,
            author,
            display_name: None,
            body: body.into(),
            file_url: None,
            created_at,
            updated_at: None,
            edited: false,
            deleted: false,
            reply: None,
        }
    }

    /// Whether the body is a file reference
    pub fn is_file(&self) -> bool {
        self.file_url.is_some()
    }

    /// Replace the body with `text` and mark the message edited.
    ///
    /// Applies to deleted messages too; the `deleted` flag is kept.
    pub(crate) fn edit(&mut self, text: &str, now: DateTime<Utc>) {
        self.body = text.to_string();
        self.edited = true;
        self.updated_at = Some(now);
    }

    /// Tombstone the message. Id, author and timestamps are kept.
    pub(crate) fn tombstone(&mut self) {
        self.deleted = true;
        self.body = MESSAGE_TOMBSTONE.to_string();
    }
}

/// What an outbound payload carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    /// Plain text (`MSG`)
    Text,
    /// URL of an uploaded file (`MSG_FILE`)
    File,
}

/// A message the local user wants to send.
///
/// The same shape is transmitted live or stored in the offline queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundPayload {
    pub kind: PayloadKind,
    pub author: UserId,
    pub room_id: RoomId,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReplyRef>,
}

impl OutboundPayload {
    /// A text message
    pub fn text(author: UserId, room_id: RoomId, body: impl Into<String>) -> Self {
        Self {
            kind: PayloadKind::Text,
            author,
            room_id,
            body: body.into(),
            reply: None,
        }
    }

    /// A file message whose body is the URL returned by the upload collaborator
    pub fn file(author: UserId, room_id: RoomId, url: impl Into<String>) -> Self {
        Self {
            kind: PayloadKind::File,
            author,
            room_id,
            body: url.into(),
            reply: None,
        }
    }

    /// Attach a reply snapshot of `target`
    pub fn replying_to(mut self, target: &Message) -> Self {
        self.reply = Some(ReplyRef::to_message(target));
        self
    }
}
