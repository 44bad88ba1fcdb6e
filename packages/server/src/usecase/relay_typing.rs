//! UseCase: 入力中通知の中継

use std::sync::Arc;

use crate::domain::{MessagePusher, UserId};

/// 入力中通知を受信者へ中継するユースケース
pub struct RelayTypingUseCase {
    message_pusher: Arc<dyn MessagePusher>,
}

impl RelayTypingUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// 受信者の全ソケットへ通知を送る
    ///
    /// 受信者がオフラインなら通知は捨てられる（保存しない）。
    ///
    /// # Returns
    ///
    /// 通知を届けられたかどうか
    pub async fn execute(&self, receiver_id: &UserId, json: &str) -> bool {
        match self.message_pusher.push_to_user(receiver_id, json).await {
            Ok(sockets) => sockets > 0,
            Err(e) => {
                tracing::trace!("Typing notice dropped: {}", e);
                false
            }
        }
    }
}
