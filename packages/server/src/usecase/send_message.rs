//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() と deliver()
//!
//! ### どのような状況を想定しているか
//! - 正常系：メッセージが保存され、送信者と受信者の全ソケットに届く
//! - 異常系：存在しない受信者、空の本文
//! - エッジケース：自分宛てのメッセージ（同じソケットに 2 回届かない）

use std::sync::Arc;

use tabiji_shared::time::current_timestamp_millis;

use crate::domain::{
    ChatMessage, ChatRepository, MessageContent, MessagePusher, RepositoryError, Timestamp,
    UserId,
};

use super::error::SendMessageError;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    repository: Arc<dyn ChatRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl SendMessageUseCase {
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// メッセージを検証して保存する
    ///
    /// # Returns
    ///
    /// * `Ok(ChatMessage)` - 保存されたメッセージ（サーバー発行の ID 付き）
    /// * `Err(SendMessageError)` - 検証または保存の失敗
    pub async fn execute(
        &self,
        sender_id: UserId,
        receiver_id: &str,
        content: String,
    ) -> Result<ChatMessage, SendMessageError> {
        let receiver_id = UserId::new(receiver_id)
            .map_err(|e| SendMessageError::InvalidMessage(e.to_string()))?;
        let content = MessageContent::new(content)
            .map_err(|e| SendMessageError::InvalidMessage(e.to_string()))?;

        let message = ChatMessage::new(
            sender_id,
            receiver_id,
            content,
            Timestamp::new(current_timestamp_millis()),
        );
        self.repository
            .add_message(message.clone())
            .await
            .map_err(|e| match e {
                RepositoryError::UserNotFound(id) => SendMessageError::ReceiverNotFound(id),
            })?;

        tracing::debug!(
            "Stored message {} from '{}' to '{}'",
            message.id.as_str(),
            message.sender_id,
            message.receiver_id
        );
        Ok(message)
    }

    /// 保存済みメッセージを送信者・受信者の全ソケットへ届ける
    ///
    /// 送信者の他のタブにも届くため、送信元のクライアントは自分のメッセージの確定を受け取れる。
    pub async fn deliver(&self, message: &ChatMessage, json: &str) {
        let mut recipients = vec![&message.sender_id];
        if message.receiver_id != message.sender_id {
            recipients.push(&message.receiver_id);
        }
        for user_id in recipients {
            match self.message_pusher.push_to_user(user_id, json).await {
                Ok(sockets) => {
                    tracing::debug!("Delivered to {} socket(s) of '{}'", sockets, user_id)
                }
                Err(e) => tracing::debug!("Not delivered to '{}': {}", user_id, e),
            }
        }
    }
}
