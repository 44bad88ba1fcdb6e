//! Domain 層のエラー定義

use thiserror::Error;

/// 値オブジェクトの検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("user id must not be empty")]
    EmptyUserId,

    #[error("message content must not be empty")]
    EmptyContent,

    #[error("message content is too long ({0} chars)")]
    ContentTooLong(usize),
}

/// Repository のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("user not found: {0}")]
    UserNotFound(String),
}

/// MessagePusher のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("user not connected: {0}")]
    UserNotConnected(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}
