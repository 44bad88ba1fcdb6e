//! UseCase: 会話一覧の取得

use std::sync::Arc;

use crate::domain::{ChatRepository, ConversationView, UserId};

/// 会話一覧取得のユースケース
pub struct GetConversationsUseCase {
    repository: Arc<dyn ChatRepository>,
}

impl GetConversationsUseCase {
    pub fn new(repository: Arc<dyn ChatRepository>) -> Self {
        Self { repository }
    }

    /// `me` が参加している会話を最新メッセージが新しい順に返す
    pub async fn execute(&self, me: &UserId) -> Vec<ConversationView> {
        self.repository.conversations(me).await
    }
}
