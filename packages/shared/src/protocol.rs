//! Wire protocol shared by the chat client core and the development backend.
//!
//! Every WebSocket frame is a JSON object `{"event": <name>, "data": <payload>}`.
//! Field names follow the backend's camelCase convention. These types are the
//! untyped edge of the system: the client normalizes them into domain values
//! before anything else looks at them.

use serde::{Deserialize, Serialize};

/// Query parameter carrying the bearer credential on the WebSocket URL.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Path of the WebSocket endpoint.
pub const SOCKET_PATH: &str = "/socket";

/// Path of the conversation list endpoint.
pub const CONVERSATIONS_PATH: &str = "/api/chat/conversations";

/// Path prefix of the history endpoint (`{prefix}/{counterpart_id}`).
pub const MESSAGES_PATH_PREFIX: &str = "/api/chat/messages";

/// Timestamp as it appears on the wire: either epoch milliseconds or an RFC 3339 string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireTimestamp {
    Millis(i64),
    Text(String),
}

/// A message record as sent by the backend, both pushed and fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub created_at: WireTimestamp,
    #[serde(default)]
    pub is_read: bool,
}

/// Typing indicator pushed to the receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingNotice {
    pub sender_id: String,
    pub is_typing: bool,
}

/// Presence of a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceRecord {
    pub user_id: String,
    pub is_online: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<WireTimestamp>,
}

/// Presence snapshot sent to a socket right after it connects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceSnapshot {
    pub users: Vec<PresenceRecord>,
}

/// Events pushed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    NewMessage(MessageRecord),
    Typing(TypingNotice),
    Presence(PresenceSnapshot),
    PresenceUpdate(PresenceRecord),
}

/// Payload of an outbound `send_message` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub receiver_id: String,
    pub content: String,
}

/// Payload of an outbound `typing` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub receiver_id: String,
    pub is_typing: bool,
}

/// Events emitted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    SendMessage(SendMessagePayload),
    Typing(TypingPayload),
}

/// Response body of the history endpoint. Messages are newest-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub success: bool,
    #[serde(default)]
    pub messages: Vec<MessageRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The other participant of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterpartRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Last message shown in a conversation summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMessageRecord {
    pub content: String,
    pub created_at: WireTimestamp,
    pub from_me: bool,
}

/// One conversation summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    pub counterpart: CounterpartRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<LastMessageRecord>,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub is_self: bool,
}

/// Response body of the conversation list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationListResponse {
    pub success: bool,
    #[serde(default)]
    pub conversations: Vec<ConversationRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
