//! Domain Model から wire DTO（`tabiji_shared::protocol`）への変換

use tabiji_shared::{
    protocol::{
        ConversationRecord, CounterpartRecord, LastMessageRecord, MessageRecord,
        PresenceRecord, PresenceSnapshot, ServerEvent, TypingNotice, WireTimestamp,
    },
    time::timestamp_to_rfc3339,
};

use crate::domain::{ChatMessage, ConversationView, PresenceView, Timestamp, UserId};

/// タイムスタンプは RFC 3339 文字列で送る（表現できない値はミリ秒のまま）
fn wire_timestamp(timestamp: Timestamp) -> WireTimestamp {
    match timestamp_to_rfc3339(timestamp.value()) {
        Some(text) => WireTimestamp::Text(text),
        None => WireTimestamp::Millis(timestamp.value()),
    }
}

impl From<&ChatMessage> for MessageRecord {
    fn from(message: &ChatMessage) -> Self {
        Self {
            id: message.id.as_str().to_string(),
            sender_id: message.sender_id.as_str().to_string(),
            receiver_id: message.receiver_id.as_str().to_string(),
            content: message.content.as_str().to_string(),
            created_at: wire_timestamp(message.created_at),
            is_read: message.is_read,
        }
    }
}

impl From<&PresenceView> for PresenceRecord {
    fn from(presence: &PresenceView) -> Self {
        Self {
            user_id: presence.user_id.as_str().to_string(),
            is_online: presence.is_online,
            last_seen: presence.last_seen.map(wire_timestamp),
        }
    }
}

/// `me` から見た会話の要約を DTO に変換
pub fn conversation_record(me: &UserId, view: &ConversationView) -> ConversationRecord {
    ConversationRecord {
        counterpart: CounterpartRecord {
            id: view.counterpart.id.as_str().to_string(),
            name: view.counterpart.name.clone(),
            avatar: view.counterpart.avatar.clone(),
        },
        last_message: view.last_message.as_ref().map(|message| LastMessageRecord {
            content: message.content.as_str().to_string(),
            created_at: wire_timestamp(message.created_at),
            from_me: message.sender_id == *me,
        }),
        unread_count: view.unread_count,
        is_self: view.is_self,
    }
}

pub fn new_message_event(message: &ChatMessage) -> ServerEvent {
    ServerEvent::NewMessage(message.into())
}

pub fn typing_event(sender_id: &UserId, is_typing: bool) -> ServerEvent {
    ServerEvent::Typing(TypingNotice {
        sender_id: sender_id.as_str().to_string(),
        is_typing,
    })
}

pub fn presence_snapshot_event(presence: &[PresenceView]) -> ServerEvent {
    ServerEvent::Presence(PresenceSnapshot {
        users: presence.iter().map(PresenceRecord::from).collect(),
    })
}

pub fn presence_update_event(presence: &PresenceView) -> ServerEvent {
    ServerEvent::PresenceUpdate(presence.into())
}

/// イベントを JSON フレームにシリアライズ
pub fn encode(event: &ServerEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}
