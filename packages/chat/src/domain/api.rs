//! REST API trait 定義
//!
//! コントローラーが必要とするバックエンドへのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{ApiError, ConversationSummary, Message, UserId};

/// Chat REST API trait
///
/// 認証は呼び出し側が credential store から読み出した bearer token で行う。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// 会話一覧を取得
    async fn fetch_conversations(&self, token: &str)
    -> Result<Vec<ConversationSummary>, ApiError>;

    /// 相手とのメッセージ履歴を取得（新しい順）
    async fn fetch_history(
        &self,
        token: &str,
        counterpart_id: &UserId,
    ) -> Result<Vec<Message>, ApiError>;
}
