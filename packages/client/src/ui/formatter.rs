//! Message formatting utilities for client display.

use chrono::FixedOffset;
use roomlink_shared::time::format_clock_time;

use crate::domain::{ConnectionState, Message, MessageId, RoomId, UserId};

const RULE: &str = "------------------------------------------------------------";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the banner printed when a room is (re)joined
    pub fn format_room_joined(room: &RoomId, history: &[Message], offset: &FixedOffset) -> String {
        let mut output = String::new();
        output.push_str("\n\n============================================================\n");
        output.push_str(&format!("Room: {}\n", room));
        if history.is_empty() {
            output.push_str("(No messages yet)\n");
        } else {
            for message in history {
                output.push_str(&Self::format_line(message, offset));
                output.push('\n');
            }
        }
        output.push_str("============================================================\n");
        output
    }

    /// Format a message that was just appended to the log
    ///
    /// # Arguments
    ///
    /// * `message` - The appended message
    /// * `offset` - Local time zone for the timestamp
    pub fn format_chat_message(message: &Message, offset: &FixedOffset) -> String {
        let mut output = format!("\n\n{}\n", RULE);
        if let Some(reply) = &message.reply {
            let author = reply
                .author
                .as_ref()
                .map_or("someone".to_string(), |author| format!("@{}", author));
            match &reply.body {
                Some(body) => output.push_str(&format!("  > {}: {}\n", author, body)),
                None => output.push_str(&format!("  > {} ({})\n", author, reply.message_id)),
            }
        }
        output.push_str(&Self::format_line(message, offset));
        output.push_str(&format!("\nid {}\n{}\n", message.id, RULE));
        output
    }

    /// Format an edited message
    pub fn format_edited(message: &Message, offset: &FixedOffset) -> String {
        format!("\n~ {}\n", Self::format_line(message, offset))
    }

    pub fn format_deleted(message_id: &MessageId) -> String {
        format!("\nx message {} was deleted\n", message_id)
    }

    /// Format the typing indicator line, or `None` when nobody is typing
    pub fn format_typing(users: &[UserId]) -> Option<String> {
        let line = match users {
            [] => return None,
            [one] => format!("{} is typing...", one),
            [first, second] => format!("{} and {} are typing...", first, second),
            [first, second, rest @ ..] => format!(
                "{}, {} and {} other(s) are typing...",
                first,
                second,
                rest.len()
            ),
        };
        Some(format!("\n{}\n", line))
    }

    pub fn format_connection_state(state: ConnectionState, room: &RoomId) -> String {
        let status = match state {
            ConnectionState::Idle => "disconnected".to_string(),
            ConnectionState::Connecting => "connecting...".to_string(),
            ConnectionState::Open => "connected".to_string(),
            ConnectionState::Reconnecting { attempt } => {
                format!("connection lost, retry #{} scheduled", attempt + 1)
            }
        };
        format!("\n* [{}] {}\n", room, status)
    }

    /// Format a confirmation that a message was handed to the connection
    pub fn format_sent_confirmation(state: ConnectionState) -> String {
        if state.is_open() {
            "sent\n".to_string()
        } else {
            "queued until reconnected\n".to_string()
        }
    }

    fn format_line(message: &Message, offset: &FixedOffset) -> String {
        let author = message
            .display_name
            .as_deref()
            .unwrap_or(message.author.as_str());
        let body = if message.is_file() && !message.deleted {
            format!("[file] {}", message.body)
        } else {
            message.body.clone()
        };
        let edited = if message.edited {
            " (edited)"
        } else {
            ""
        };
        format!(
            "[{}] @{}: {}{}",
            format_clock_time(message.created_at, offset),
            author,
            body,
            edited
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::domain::{MESSAGE_TOMBSTONE, ReplyRef};

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn message(id: &str, author: &str, body: &str) -> Message {
        Message::new(
            MessageId::new(id).unwrap(),
            RoomId::new("general").unwrap(),
            UserId::new(author).unwrap(),
            body,
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    fn users(names: &[&str]) -> Vec<UserId> {
        names.iter().map(|name| UserId::new(*name).unwrap()).collect()
    }

    #[test]
    fn test_format_chat_message() {
        // テスト項目: チャットメッセージが時刻・送信者・本文・ID 付きでフォーマットされる
        // given (前提条件):
        let message = message("m1", "alice", "Hello, world!");

        // when (操作):
        let result = MessageFormatter::format_chat_message(&message, &jst());

        // then (期待する結果):
        assert!(result.contains("[09:00:00] @alice: Hello, world!"));
        assert!(result.contains("id m1"));
        assert!(result.contains(RULE));
    }

    #[test]
    fn test_format_chat_message_prefers_display_name_and_shows_reply() {
        // テスト項目: 表示名があれば使われ、返信先の引用が表示される
        // given (前提条件):
        let target = message("m1", "bob", "lunch?");
        let mut reply = message("m2", "alice", "sure");
        reply.display_name = Some("Alice".to_string());
        reply.reply = Some(ReplyRef::to_message(&target));

        // when (操作):
        let result = MessageFormatter::format_chat_message(&reply, &jst());

        // then (期待する結果):
        assert!(result.contains("> @bob: lunch?"));
        assert!(result.contains("@Alice: sure"));
    }

    #[test]
    fn test_format_file_and_edited_messages() {
        // テスト項目: ファイルメッセージと編集済みメッセージに印が付く
        // given (前提条件):
        let mut file = message("m1", "bob", "https://files.example.com/cat.png");
        file.file_url = Some(file.body.clone());
        let mut edited = message("m2", "bob", "fixed typo");
        edited.edited = true;

        // when (操作):
        let file_result = MessageFormatter::format_chat_message(&file, &jst());
        let edited_result = MessageFormatter::format_edited(&edited, &jst());

        // then (期待する結果):
        assert!(file_result.contains("[file] https://files.example.com/cat.png"));
        assert!(edited_result.contains("fixed typo (edited)"));
    }

    #[test]
    fn test_format_deleted_message_shows_tombstone_only() {
        // テスト項目: 削除済みメッセージは墓標テキストのみ表示される
        // given (前提条件):
        let mut deleted = message("m1", "bob", MESSAGE_TOMBSTONE);
        deleted.deleted = true;

        // when (操作):
        let result = MessageFormatter::format_room_joined(
            &RoomId::new("general").unwrap(),
            &[deleted],
            &jst(),
        );

        // then (期待する結果):
        assert!(result.contains(MESSAGE_TOMBSTONE));
        assert!(!result.contains("(edited)"));
    }

    #[test]
    fn test_format_room_joined_without_history() {
        // テスト項目: 履歴が空の場合、適切なメッセージが表示される
        let result =
            MessageFormatter::format_room_joined(&RoomId::new("general").unwrap(), &[], &jst());

        assert!(result.contains("Room: general"));
        assert!(result.contains("(No messages yet)"));
    }

    #[test]
    fn test_format_typing() {
        // テスト項目: 入力中のユーザー数に応じて表示が変わる
        assert_eq!(MessageFormatter::format_typing(&[]), None);
        assert_eq!(
            MessageFormatter::format_typing(&users(&["bob"])).as_deref(),
            Some("\nbob is typing...\n")
        );
        assert!(
            MessageFormatter::format_typing(&users(&["bob", "carol"]))
                .unwrap()
                .contains("bob and carol are typing")
        );
        assert!(
            MessageFormatter::format_typing(&users(&["bob", "carol", "dave", "erin"]))
                .unwrap()
                .contains("bob, carol and 2 other(s)")
        );
    }

    #[test]
    fn test_format_connection_state() {
        // テスト項目: 接続状態が人間向けの文言で表示される
        // given (前提条件):
        let room = RoomId::new("general").unwrap();

        // when (操作):
        let open = MessageFormatter::format_connection_state(ConnectionState::Open, &room);
        let retry = MessageFormatter::format_connection_state(
            ConnectionState::Reconnecting { attempt: 2 },
            &room,
        );

        // then (期待する結果):
        assert!(open.contains("[general] connected"));
        assert!(retry.contains("retry #3"));
    }

    #[test]
    fn test_format_sent_confirmation() {
        // テスト項目: 切断中の送信はキューに積まれた旨が表示される
        assert_eq!(
            MessageFormatter::format_sent_confirmation(ConnectionState::Open),
            "sent\n"
        );
        assert!(
            MessageFormatter::format_sent_confirmation(ConnectionState::Connecting)
                .contains("queued")
        );
    }
}
