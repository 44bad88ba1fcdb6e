//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{ChatMessage, ConversationView, RepositoryError, Timestamp, User, UserId};

/// Chat Repository trait
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// bearer token からユーザーを特定
    async fn authenticate(&self, token: &str) -> Option<User>;

    /// ユーザーを取得
    async fn find_user(&self, user_id: &UserId) -> Option<User>;

    /// 全ユーザーを取得（ID 順）
    async fn list_users(&self) -> Vec<User>;

    /// メッセージを保存（送信者・受信者が存在しない場合はエラー）
    async fn add_message(&self, message: ChatMessage) -> Result<(), RepositoryError>;

    /// 2 者間のメッセージ履歴を取得（新しい順）
    async fn history(&self, me: &UserId, counterpart: &UserId) -> Vec<ChatMessage>;

    /// `counterpart` から `reader` 宛ての未読メッセージを既読にする。既読にした件数を返す
    async fn mark_read(&self, reader: &UserId, counterpart: &UserId) -> usize;

    /// ユーザーの会話一覧を取得（最新メッセージが新しい順）
    async fn conversations(&self, me: &UserId) -> Vec<ConversationView>;

    /// 最終接続時刻を記録
    async fn set_last_seen(&self, user_id: &UserId, at: Timestamp);

    /// 最終接続時刻を取得
    async fn last_seen(&self, user_id: &UserId) -> Option<Timestamp>;
}
