//! UseCase 層のエラー定義

use thiserror::Error;

/// 認証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("unknown or missing token")]
    InvalidToken,
}

/// メッセージ送信エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("receiver not found: {0}")]
    ReceiverNotFound(String),
}

/// 履歴取得エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("counterpart not found: {0}")]
    CounterpartNotFound(String),
}
