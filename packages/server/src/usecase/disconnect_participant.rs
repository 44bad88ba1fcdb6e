//! UseCase: ソケット切断処理
//!
//! ユーザーの最後のソケットが閉じたときだけオフラインとして扱い、
//! 最終接続時刻を記録する。

use std::sync::Arc;

use tabiji_shared::time::current_timestamp_millis;

use crate::domain::{
    ChatRepository, MessagePusher, PresenceView, SocketId, Timestamp, UserId,
};

/// ソケット切断のユースケース
pub struct DisconnectParticipantUseCase {
    repository: Arc<dyn ChatRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectParticipantUseCase {
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// ソケットを登録解除する
    ///
    /// # Returns
    ///
    /// 最後のソケットだった場合はオフラインになった presence（通知が必要）
    pub async fn execute(&self, user_id: &UserId, socket_id: &SocketId) -> Option<PresenceView> {
        if !self
            .message_pusher
            .unregister_socket(user_id, socket_id)
            .await
        {
            return None;
        }

        let last_seen = Timestamp::new(current_timestamp_millis());
        self.repository.set_last_seen(user_id, last_seen).await;
        Some(PresenceView {
            user_id: user_id.clone(),
            is_online: false,
            last_seen: Some(last_seen),
        })
    }

    /// ユーザーがオフラインになったことを残りのユーザーに通知
    pub async fn broadcast_offline(&self, user_id: &UserId, message: &str) {
        self.message_pusher.broadcast_except(user_id, message).await;
    }
}
