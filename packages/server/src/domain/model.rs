//! Domain Model（サーバー側）
//!
//! ユーザー、メッセージ、会話のエンティティと値オブジェクト。

use std::fmt;

use super::error::ValueObjectError;

/// メッセージ本文の最大文字数
pub const MAX_CONTENT_CHARS: usize = 4000;

/// ユーザー ID（値オブジェクト）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValueObjectError::EmptyUserId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// メッセージ ID（サーバーが発行する）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(String);

impl MessageId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// WebSocket 接続 ID
///
/// 同じユーザーが複数の接続（タブ・端末）を持てるため、接続ごとに発行する。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SocketId(String);

impl SocketId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// メッセージ本文（値オブジェクト）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValueObjectError::EmptyContent);
        }
        let chars = value.chars().count();
        if chars > MAX_CONTENT_CHARS {
            return Err(ValueObjectError::ContentTooLong(chars));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MessageContent {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// ユーザー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub avatar: Option<String>,
}

/// 保存済みのメッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: MessageContent,
    pub created_at: Timestamp,
    pub is_read: bool,
}

impl ChatMessage {
    pub fn new(
        sender_id: UserId,
        receiver_id: UserId,
        content: MessageContent,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            sender_id,
            receiver_id,
            content,
            created_at,
            is_read: false,
        }
    }

    /// `me` と `counterpart` の 2 者間のメッセージかどうか
    pub fn is_between(&self, me: &UserId, counterpart: &UserId) -> bool {
        (self.sender_id == *me && self.receiver_id == *counterpart)
            || (self.sender_id == *counterpart && self.receiver_id == *me)
    }

    /// 会話の相手（`me` から見て）
    pub fn counterpart_of(&self, me: &UserId) -> Option<&UserId> {
        if self.sender_id == *me {
            Some(&self.receiver_id)
        } else if self.receiver_id == *me {
            Some(&self.sender_id)
        } else {
            None
        }
    }
}

/// ユーザーから見た会話の要約
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationView {
    pub counterpart: User,
    pub last_message: Option<ChatMessage>,
    pub unread_count: u32,
    pub is_self: bool,
}

/// ユーザーのプレゼンス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceView {
    pub user_id: UserId,
    pub is_online: bool,
    pub last_seen: Option<Timestamp>,
}
