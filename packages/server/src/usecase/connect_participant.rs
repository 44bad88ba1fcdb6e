//! UseCase: ソケット接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 接続直後に送る presence スナップショットの構築
//!
//! ### どのような状況を想定しているか
//! - 正常系：ユーザーの最初のソケット（オンライン通知が必要）
//! - エッジケース：同じユーザーの 2 本目のソケット（通知不要）

use std::sync::Arc;

use crate::domain::{
    ChatRepository, MessagePusher, PresenceView, PusherChannel, SocketId, UserId,
};

/// ソケット接続のユースケース
pub struct ConnectParticipantUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn ChatRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectParticipantUseCase {
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// ソケットを登録する
    ///
    /// # Returns
    ///
    /// ユーザーの最初のソケットなら `true`（他のユーザーへのオンライン通知が必要）
    pub async fn execute(
        &self,
        user_id: UserId,
        socket_id: SocketId,
        sender: PusherChannel,
    ) -> bool {
        self.message_pusher
            .register_socket(user_id, socket_id, sender)
            .await
    }

    /// 全ユーザーの presence を構築（ID 順）
    pub async fn presence_snapshot(&self) -> Vec<PresenceView> {
        let online = self.message_pusher.online_users().await;
        let mut snapshot = Vec::new();
        for user in self.repository.list_users().await {
            let is_online = online.contains(&user.id);
            let last_seen = if is_online {
                None
            } else {
                self.repository.last_seen(&user.id).await
            };
            snapshot.push(PresenceView {
                user_id: user.id,
                is_online,
                last_seen,
            });
        }
        snapshot
    }

    /// ユーザーがオンラインになったことを他のユーザーに通知
    pub async fn broadcast_online(&self, user_id: &UserId, message: &str) {
        self.message_pusher.broadcast_except(user_id, message).await;
    }
}
