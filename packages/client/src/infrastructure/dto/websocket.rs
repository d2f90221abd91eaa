//! WebSocket frame DTO.
//!
//! Every frame is a flat JSON object whose `Event` field selects its meaning.
//! All payload fields are optional at this level; which ones are required is
//! decided per event in [`super::conversion`]. Unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// Frame discriminants understood by this client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Msg,
    MsgFile,
    MsgEdit,
    MsgDelete,
    TypingStart,
    TypingStop,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Msg => "MSG",
            Self::MsgFile => "MSG_FILE",
            Self::MsgEdit => "MSG_EDIT",
            Self::MsgDelete => "MSG_DELETE",
            Self::TypingStart => "TYPING_START",
            Self::TypingStop => "TYPING_STOP",
        }
    }

    /// `None` for discriminants this client does not know
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "MSG" => Some(Self::Msg),
            "MSG_FILE" => Some(Self::MsgFile),
            "MSG_EDIT" => Some(Self::MsgEdit),
            "MSG_DELETE" => Some(Self::MsgDelete),
            "TYPING_START" => Some(Self::TypingStart),
            "TYPING_STOP" => Some(Self::TypingStop),
            _ => None,
        }
    }
}

/// One JSON frame, inbound or outbound
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireFrame {
    #[serde(rename = "Event")]
    pub event: String,
    #[serde(rename = "User", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_user: Option<String>,
}

impl WireFrame {
    /// A frame with only the discriminant set
    pub fn new(kind: EventKind) -> Self {
        Self {
            event: kind.as_str().to_string(),
            ..Self::default()
        }
    }

    /// The known discriminant, if any
    pub fn kind(&self) -> Option<EventKind> {
        EventKind::parse(&self.event)
    }

    /// Parse a text frame
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Serialize for transmission
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_parse_is_inverse_of_as_str() {
        // テスト項目: 既知の Event 名は相互変換でき、未知の名前は None になる
        for kind in [
            EventKind::Msg,
            EventKind::MsgFile,
            EventKind::MsgEdit,
            EventKind::MsgDelete,
            EventKind::TypingStart,
            EventKind::TypingStop,
        ] {
            assert_eq!(EventKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EventKind::parse("CHATLOG"), None);
        assert_eq!(EventKind::parse("msg"), None);
    }

    #[test]
    fn test_serialization_uses_protocol_field_names_and_skips_absent() {
        // テスト項目: シリアライズ時はプロトコルのフィールド名を使い、None は出力しない
        // given (前提条件):
        let frame = WireFrame {
            user: Some("alice".to_string()),
            room_id: Some("general".to_string()),
            ..WireFrame::new(EventKind::TypingStart)
        };

        // when (操作):
        let json = frame.to_json().unwrap();

        // then (期待する結果):
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"Event": "TYPING_START", "User": "alice", "room_id": "general"})
        );
    }

    #[test]
    fn test_deserialization_ignores_unknown_fields() {
        // テスト項目: サーバーが付加する未知のフィールドは無視される
        // given (前提条件):
        let text = r#"{"Event":"MSG","User":"bob","message":"hi","room_id":"r1","_id":"64f","owner":true}"#;

        // when (操作):
        let frame = WireFrame::from_json(text).unwrap();

        // then (期待する結果):
        assert_eq!(frame.kind(), Some(EventKind::Msg));
        assert_eq!(frame.id.as_deref(), Some("64f"));
    }

    #[test]
    fn test_deserialization_requires_event() {
        // テスト項目: Event がないフレームはパースエラーになる
        assert!(WireFrame::from_json(r#"{"User":"bob"}"#).is_err());
        assert!(WireFrame::from_json("not json").is_err());
    }
}
