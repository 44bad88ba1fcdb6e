//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - ユーザーごと・ソケットごとの `UnboundedSender` を管理
//! - ユーザーの全ソケットへの送信、全ユーザーへのブロードキャスト
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{MessagePushError, MessagePusher, PusherChannel, SocketId, UserId};

/// WebSocket を使った MessagePusher 実装
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// Key: user_id, Value: そのユーザーのソケット
    clients: Mutex<HashMap<UserId, HashMap<SocketId, PusherChannel>>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_socket(
        &self,
        user_id: UserId,
        socket_id: SocketId,
        sender: PusherChannel,
    ) -> bool {
        let mut clients = self.clients.lock().await;
        let sockets = clients.entry(user_id.clone()).or_default();
        let first = sockets.is_empty();
        sockets.insert(socket_id, sender);
        tracing::debug!(
            "Socket registered for '{}' ({} open)",
            user_id,
            sockets.len()
        );
        first
    }

    async fn unregister_socket(&self, user_id: &UserId, socket_id: &SocketId) -> bool {
        let mut clients = self.clients.lock().await;
        let Some(sockets) = clients.get_mut(user_id) else {
            return false;
        };
        if sockets.remove(socket_id).is_none() {
            return false;
        }
        tracing::debug!(
            "Socket unregistered for '{}' ({} open)",
            user_id,
            sockets.len()
        );
        if sockets.is_empty() {
            clients.remove(user_id);
            return true;
        }
        false
    }

    async fn push_to_user(
        &self,
        user_id: &UserId,
        content: &str,
    ) -> Result<usize, MessagePushError> {
        let clients = self.clients.lock().await;
        let Some(sockets) = clients.get(user_id) else {
            return Err(MessagePushError::UserNotConnected(
                user_id.as_str().to_string(),
            ));
        };

        let mut delivered = 0;
        for (socket_id, sender) in sockets {
            match sender.send(content.to_string()) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!(
                    "Failed to push to socket {} of '{}': {}",
                    socket_id.as_str(),
                    user_id,
                    e
                ),
            }
        }
        if delivered == 0 {
            return Err(MessagePushError::PushFailed(format!(
                "no live socket for '{}'",
                user_id
            )));
        }
        Ok(delivered)
    }

    async fn broadcast_except(&self, exclude: &UserId, content: &str) {
        let clients = self.clients.lock().await;
        for (user_id, sockets) in clients.iter().filter(|(user_id, _)| *user_id != exclude) {
            for sender in sockets.values() {
                // ブロードキャストでは一部の送信失敗を許容
                if let Err(e) = sender.send(content.to_string()) {
                    tracing::warn!("Failed to broadcast to '{}': {}", user_id, e);
                }
            }
        }
    }

    async fn online_users(&self) -> Vec<UserId> {
        let clients = self.clients.lock().await;
        let mut users: Vec<UserId> = clients.keys().cloned().collect();
        users.sort();
        users
    }
}
