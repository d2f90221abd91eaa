//! Local chat state: the single source of truth for rendered room content.
//!
//! Per room, an ordered message log (append order of arrival, never re-sorted)
//! and the set of users currently typing. Pure data, no I/O.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::event::InboundEvent;
use super::message::Message;
use super::value_object::{MessageId, RoomId, UserId};

/// A change applied to the chat state, for re-rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatUpdate {
    /// A message was appended to the room log
    MessageAppended { room: RoomId, message: Message },
    /// Messages with this id were edited
    MessageEdited { room: RoomId, message_id: MessageId },
    /// Messages with this id were tombstoned
    MessageDeleted { room: RoomId, message_id: MessageId },
    /// The room's typing set changed; `users` is the new set
    TypingChanged { room: RoomId, users: Vec<UserId> },
}

/// Messages and typing users for every room seen so far
#[derive(Debug, Clone, Default)]
pub struct ChatState {
    messages: HashMap<RoomId, Vec<Message>>,
    typing: HashMap<RoomId, Vec<UserId>>,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The room's log in arrival order
    pub fn messages(&self, room: &RoomId) -> &[Message] {
        self.messages.get(room).map(Vec::as_slice).unwrap_or_default()
    }

    /// Users typing in the room, in the order they started
    pub fn typing_users(&self, room: &RoomId) -> &[UserId] {
        self.typing.get(room).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_typing(&self, room: &RoomId, author: &UserId) -> bool {
        self.typing_users(room).contains(author)
    }

    /// Set the full ordered log for a room, as returned by a history fetch
    pub fn replace_history(&mut self, room: &RoomId, messages: Vec<Message>) {
        self.messages.insert(room.clone(), messages);
    }

    /// Append one message. Entries with the same id are not deduplicated.
    pub fn append(&mut self, room: &RoomId, message: Message) {
        self.messages.entry(room.clone()).or_default().push(message);
    }

    /// Append a live message and clear its author's typing flag.
    ///
    /// Returns `true` if the typing set changed.
    pub fn receive(&mut self, room: &RoomId, message: Message) -> bool {
        let author = message.author.clone();
        self.append(room, message);
        self.set_typing(room, &author, false)
    }

    /// Edit every entry with `id`. Returns `false` when nothing matched.
    pub fn apply_edit(
        &mut self,
        room: &RoomId,
        id: &MessageId,
        text: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(log) = self.messages.get_mut(room) else {
            return false;
        };
        let mut matched = false;
        for message in log.iter_mut().filter(|m| &m.id == id) {
            message.edit(text, now);
            matched = true;
        }
        matched
    }

    /// Tombstone every entry with `id`. Returns `false` when nothing matched.
    pub fn apply_delete(&mut self, room: &RoomId, id: &MessageId) -> bool {
        let Some(log) = self.messages.get_mut(room) else {
            return false;
        };
        let mut matched = false;
        for message in log.iter_mut().filter(|m| &m.id == id) {
            message.tombstone();
            matched = true;
        }
        matched
    }

    /// Add or remove `author` from the room's typing set.
    ///
    /// Returns `true` if the set changed.
    pub fn set_typing(&mut self, room: &RoomId, author: &UserId, is_typing: bool) -> bool {
        if is_typing {
            let users = self.typing.entry(room.clone()).or_default();
            if users.contains(author) {
                return false;
            }
            users.push(author.clone());
            true
        } else {
            let Some(users) = self.typing.get_mut(room) else {
                return false;
            };
            let before = users.len();
            users.retain(|u| u != author);
            users.len() != before
        }
    }

    /// Fold one inbound event for `room` into the state.
    ///
    /// `TYPING_START` from `local_user` is ignored. Returns the updates that
    /// actually changed something.
    pub fn apply_inbound(
        &mut self,
        room: &RoomId,
        local_user: &UserId,
        event: InboundEvent,
        now: DateTime<Utc>,
    ) -> Vec<ChatUpdate> {
        let mut updates = Vec::new();
        match event {
            InboundEvent::Message(incoming) => {
                let message = incoming.into_message(room, now);
                let typing_changed = self.receive(room, message.clone());
                updates.push(ChatUpdate::MessageAppended {
                    room: room.clone(),
                    message,
                });
                if typing_changed {
                    updates.push(self.typing_update(room));
                }
            }
            InboundEvent::Edited { message_id, body } => {
                if self.apply_edit(room, &message_id, &body, now) {
                    updates.push(ChatUpdate::MessageEdited {
                        room: room.clone(),
                        message_id,
                    });
                }
            }
            InboundEvent::Deleted { message_id } => {
                if self.apply_delete(room, &message_id) {
                    updates.push(ChatUpdate::MessageDeleted {
                        room: room.clone(),
                        message_id,
                    });
                }
            }
            InboundEvent::TypingStarted { author } => {
                if &author != local_user && self.set_typing(room, &author, true) {
                    updates.push(self.typing_update(room));
                }
            }
            InboundEvent::TypingStopped { author } => {
                if self.set_typing(room, &author, false) {
                    updates.push(self.typing_update(room));
                }
            }
        }
        updates
    }

    fn typing_update(&self, room: &RoomId) -> ChatUpdate {
        ChatUpdate::TypingChanged {
            room: room.clone(),
            users: self.typing_users(room).to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::IncomingMessage;
    use crate::domain::message::MESSAGE_TOMBSTONE;

    fn room() -> RoomId {
        RoomId::new("general").unwrap()
    }

    fn user(name: &str) -> UserId {
        UserId::new(name).unwrap()
    }

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    fn message(id: &str, author: &str, body: &str) -> Message {
        Message::new(MessageId::new(id).unwrap(), room(), user(author), body, at(1_000))
    }

    #[test]
    fn test_replace_history_is_idempotent() {
        // テスト項目: 同じ履歴で 2 回置き換えても状態は同じ
        // given (前提条件):
        let mut state = ChatState::new();
        let history = vec![message("m1", "alice", "a"), message("m2", "bob", "b")];

        // when (操作):
        state.replace_history(&room(), history.clone());
        let once = state.messages(&room()).to_vec();
        state.replace_history(&room(), history);

        // then (期待する結果):
        assert_eq!(state.messages(&room()), once.as_slice());
    }

    #[test]
    fn test_append_keeps_arrival_order_and_duplicates() {
        // テスト項目: 追加は到着順で、同じ ID でも重複排除しない
        // given (前提条件):
        let mut state = ChatState::new();
        state.replace_history(&room(), vec![message("m1", "alice", "first")]);

        // when (操作):
        let mut older = message("m0", "bob", "late arrival");
        older.created_at = at(0);
        state.append(&room(), older);
        state.append(&room(), message("m1", "alice", "first"));

        // then (期待する結果):
        let ids: Vec<_> = state.messages(&room()).iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m0", "m1"]);
    }

    #[test]
    fn test_apply_edit_updates_matching_message() {
        // テスト項目: ID が一致するメッセージが編集される
        // given (前提条件):
        let mut state = ChatState::new();
        state.append(&room(), message("m1", "alice", "helo"));

        // when (操作):
        let changed = state.apply_edit(&room(), &MessageId::new("m1").unwrap(), "hello", at(5_000));

        // then (期待する結果):
        assert!(changed);
        let edited = &state.messages(&room())[0];
        assert_eq!(edited.body, "hello");
        assert!(edited.edited);
        assert_eq!(edited.updated_at, Some(at(5_000)));
    }

    #[test]
    fn test_apply_edit_after_delete_replaces_tombstone() {
        // テスト項目: 削除済みメッセージへの編集も本文を置き換える
        // given (前提条件):
        let mut state = ChatState::new();
        let id = MessageId::new("m1").unwrap();
        state.append(&room(), message("m1", "alice", "old"));
        state.apply_delete(&room(), &id);

        // when (操作):
        let changed = state.apply_edit(&room(), &id, "new", at(6_000));

        // then (期待する結果):
        assert!(changed);
        let edited = &state.messages(&room())[0];
        assert_eq!(edited.body, "new");
        assert!(edited.edited);
        assert!(edited.deleted);
        assert_eq!(edited.updated_at, Some(at(6_000)));
    }

    #[test]
    fn test_apply_edit_unknown_id_is_noop() {
        // テスト項目: 存在しない ID の編集は何も変えない
        // given (前提条件):
        let mut state = ChatState::new();
        state.append(&room(), message("m2", "alice", "hello"));
        let before = state.messages(&room()).to_vec();

        // when (操作):
        let changed = state.apply_edit(&room(), &MessageId::new("m1").unwrap(), "hi", at(5_000));

        // then (期待する結果):
        assert!(!changed);
        assert_eq!(state.messages(&room()), before.as_slice());
    }

    #[test]
    fn test_apply_delete_is_idempotent() {
        // テスト項目: 削除を 2 回適用しても 1 回と同じ状態になる
        // given (前提条件):
        let mut state = ChatState::new();
        state.append(&room(), message("m1", "alice", "secret"));
        let id = MessageId::new("m1").unwrap();

        // when (操作):
        state.apply_delete(&room(), &id);
        let once = state.messages(&room()).to_vec();
        state.apply_delete(&room(), &id);

        // then (期待する結果):
        let twice = state.messages(&room());
        assert_eq!(twice, once.as_slice());
        assert_eq!(twice[0].id, id);
        assert_eq!(twice[0].author, user("alice"));
        assert_eq!(twice[0].created_at, at(1_000));
        assert_eq!(twice[0].body, MESSAGE_TOMBSTONE);
        assert!(twice[0].deleted);
    }

    #[test]
    fn test_set_typing_is_idempotent() {
        // テスト項目: 入力中の追加・削除は冪等
        // given (前提条件):
        let mut state = ChatState::new();
        let alice = user("alice");

        // when (操作) / then (期待する結果):
        assert!(state.set_typing(&room(), &alice, true));
        assert!(!state.set_typing(&room(), &alice, true));
        assert_eq!(state.typing_users(&room()), &[alice.clone()]);

        assert!(state.set_typing(&room(), &alice, false));
        assert!(state.typing_users(&room()).is_empty());
        assert!(!state.set_typing(&room(), &alice, false));
        assert!(state.typing_users(&room()).is_empty());
    }

    #[test]
    fn test_receive_clears_author_typing() {
        // テスト項目: メッセージを受信すると送信者の入力中表示が消える
        // given (前提条件):
        let mut state = ChatState::new();
        state.set_typing(&room(), &user("alice"), true);
        state.set_typing(&room(), &user("bob"), true);

        // when (操作):
        let changed = state.receive(&room(), message("m1", "alice", "done typing"));

        // then (期待する結果):
        assert!(changed);
        assert_eq!(state.typing_users(&room()), &[user("bob")]);
    }

    #[test]
    fn test_apply_inbound_ignores_own_typing_start() {
        // テスト項目: 自分自身の TYPING_START は無視される
        // given (前提条件):
        let mut state = ChatState::new();
        let me = user("alice");

        // when (操作):
        let updates = state.apply_inbound(
            &room(),
            &me,
            InboundEvent::TypingStarted { author: me.clone() },
            at(0),
        );

        // then (期待する結果):
        assert!(updates.is_empty());
        assert!(!state.is_typing(&room(), &me));
    }

    #[test]
    fn test_apply_inbound_message_fills_placeholder_and_time() {
        // テスト項目: ID と作成時刻がないメッセージは補完されて追加される
        // given (前提条件):
        let mut state = ChatState::new();
        state.set_typing(&room(), &user("bob"), true);
        let incoming = IncomingMessage {
            id: None,
            author: user("bob"),
            display_name: None,
            body: "https://files.example/cat.png".to_string(),
            is_file: true,
            created_at: None,
            reply: None,
        };

        // when (操作):
        let updates = state.apply_inbound(
            &room(),
            &user("alice"),
            InboundEvent::Message(incoming),
            at(42_000),
        );

        // then (期待する結果):
        assert_eq!(updates.len(), 2);
        let stored = &state.messages(&room())[0];
        assert!(stored.id.is_placeholder());
        assert_eq!(stored.created_at, at(42_000));
        assert_eq!(stored.file_url.as_deref(), Some("https://files.example/cat.png"));
        assert!(state.typing_users(&room()).is_empty());
        assert!(matches!(updates[1], ChatUpdate::TypingChanged { ref users, .. } if users.is_empty()));
    }
}
