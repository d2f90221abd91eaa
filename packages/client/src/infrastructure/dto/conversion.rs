//! Conversion logic between wire frames and domain types.

use roomlink_shared::time::parse_rfc3339;
use thiserror::Error;

use crate::domain::{
    InboundEvent, IncomingMessage, MessageId, OutboundPayload, PayloadKind, ReplyRef, RoomId,
    UserId,
};
use crate::infrastructure::dto::websocket::{EventKind, WireFrame};

/// Why an inbound frame was dropped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The discriminant is not one this client handles
    #[error("Unknown event '{0}'")]
    UnknownEvent(String),

    /// A field required by the discriminant is absent or empty
    #[error("{event} frame is missing '{field}'")]
    MissingField {
        event: &'static str,
        field: &'static str,
    },
}

/// Treat empty strings as absent
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn require(
    value: Option<String>,
    kind: EventKind,
    field: &'static str,
) -> Result<String, FrameError> {
    present(value).ok_or(FrameError::MissingField {
        event: kind.as_str(),
        field,
    })
}

/// Like [`require`] but accepts an empty string (a message body may be empty)
fn require_text(
    value: Option<String>,
    kind: EventKind,
    field: &'static str,
) -> Result<String, FrameError> {
    value.ok_or(FrameError::MissingField {
        event: kind.as_str(),
        field,
    })
}

fn user_id(value: Option<String>, kind: EventKind) -> Result<UserId, FrameError> {
    UserId::new(require(value, kind, "User")?).map_err(|_| FrameError::MissingField {
        event: kind.as_str(),
        field: "User",
    })
}

fn message_id(value: Option<String>, kind: EventKind) -> Result<MessageId, FrameError> {
    MessageId::new(require(value, kind, "message_id")?).map_err(|_| FrameError::MissingField {
        event: kind.as_str(),
        field: "message_id",
    })
}

// ========================================
// WireFrame → Domain
// ========================================

impl TryFrom<WireFrame> for InboundEvent {
    type Error = FrameError;

    fn try_from(frame: WireFrame) -> Result<Self, Self::Error> {
        let Some(kind) = frame.kind() else {
            return Err(FrameError::UnknownEvent(frame.event));
        };

        match kind {
            EventKind::Msg | EventKind::MsgFile => {
                let author = user_id(frame.user, kind)?;
                let body = require_text(frame.message, kind, "message")?;
                require(frame.room_id, kind, "room_id")?;

                let id = present(frame.id)
                    .or_else(|| present(frame.message_id))
                    .and_then(|raw| MessageId::new(raw).ok());
                let reply = present(frame.reply_to)
                    .and_then(|raw| MessageId::new(raw).ok())
                    .map(|message_id| ReplyRef {
                        message_id,
                        author: present(frame.reply_to_user).and_then(|u| UserId::new(u).ok()),
                        body: present(frame.reply_to_message),
                    });

                Ok(InboundEvent::Message(IncomingMessage {
                    id,
                    author,
                    display_name: present(frame.display_name),
                    body,
                    is_file: kind == EventKind::MsgFile,
                    created_at: present(frame.created_at).and_then(|raw| parse_rfc3339(&raw)),
                    reply,
                }))
            }
            EventKind::MsgEdit => Ok(InboundEvent::Edited {
                message_id: message_id(frame.message_id, kind)?,
                body: require_text(frame.message, kind, "message")?,
            }),
            EventKind::MsgDelete => Ok(InboundEvent::Deleted {
                message_id: message_id(frame.message_id, kind)?,
            }),
            EventKind::TypingStart | EventKind::TypingStop => {
                let author = user_id(frame.user, kind)?;
                require(frame.room_id, kind, "room_id")?;
                Ok(if kind == EventKind::TypingStart {
                    InboundEvent::TypingStarted { author }
                } else {
                    InboundEvent::TypingStopped { author }
                })
            }
        }
    }
}

// ========================================
// Domain → WireFrame
// ========================================

impl From<&OutboundPayload> for WireFrame {
    fn from(payload: &OutboundPayload) -> Self {
        let kind = match payload.kind {
            PayloadKind::Text => EventKind::Msg,
            PayloadKind::File => EventKind::MsgFile,
        };
        let reply = payload.reply.as_ref();
        Self {
            user: Some(payload.author.as_str().to_string()),
            message: Some(payload.body.clone()),
            room_id: Some(payload.room_id.as_str().to_string()),
            reply_to: reply.map(|r| r.message_id.as_str().to_string()),
            reply_to_message: reply.and_then(|r| r.body.clone()),
            reply_to_user: reply.and_then(|r| r.author.as_ref().map(|a| a.as_str().to_string())),
            ..Self::new(kind)
        }
    }
}

impl WireFrame {
    /// `TYPING_START` / `TYPING_STOP` for `user` in `room`
    pub fn typing(user: &UserId, room: &RoomId, is_typing: bool) -> Self {
        let kind = if is_typing {
            EventKind::TypingStart
        } else {
            EventKind::TypingStop
        };
        Self {
            user: Some(user.as_str().to_string()),
            room_id: Some(room.as_str().to_string()),
            ..Self::new(kind)
        }
    }
}

/// Parse and validate one inbound text frame
pub fn decode_inbound(text: &str) -> Result<InboundEvent, DecodeError> {
    let frame = WireFrame::from_json(text)?;
    Ok(InboundEvent::try_from(frame)?)
}

/// Failure to turn inbound text into an event
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unparsable frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Frame(#[from] FrameError),
}
