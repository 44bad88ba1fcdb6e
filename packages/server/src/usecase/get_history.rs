//! UseCase: 2 者間のメッセージ履歴の取得
//!
//! 履歴を取得すると、相手から自分宛ての未読メッセージは既読になる。

use std::sync::Arc;

use crate::domain::{ChatMessage, ChatRepository, UserId};

use super::error::HistoryError;

/// 履歴取得のユースケース
pub struct GetHistoryUseCase {
    repository: Arc<dyn ChatRepository>,
}

impl GetHistoryUseCase {
    pub fn new(repository: Arc<dyn ChatRepository>) -> Self {
        Self { repository }
    }

    /// 履歴を新しい順で返し、相手からの未読を既読にする
    ///
    /// 返す履歴は既読化する前の状態（`is_read`）を保持する。
    pub async fn execute(
        &self,
        me: &UserId,
        counterpart_id: &str,
    ) -> Result<Vec<ChatMessage>, HistoryError> {
        let not_found = || HistoryError::CounterpartNotFound(counterpart_id.to_string());
        let counterpart = UserId::new(counterpart_id).map_err(|_| not_found())?;
        if self.repository.find_user(&counterpart).await.is_none() {
            return Err(not_found());
        }

        let history = self.repository.history(me, &counterpart).await;
        let marked = self.repository.mark_read(me, &counterpart).await;
        if marked > 0 {
            tracing::debug!("Marked {} message(s) from '{}' as read", marked, counterpart);
        }
        Ok(history)
    }
}
