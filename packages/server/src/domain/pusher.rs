//! MessagePusher trait 定義
//!
//! 接続中のソケットへのメッセージ送信を抽象化します。
//! 1 ユーザーが複数のソケットを持てるため、登録はソケット単位で行います。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{MessagePushError, SocketId, UserId};

/// ソケットへ JSON フレームを送るチャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// ソケットを登録。ユーザーの最初のソケットなら `true`
    async fn register_socket(&self, user_id: UserId, socket_id: SocketId, sender: PusherChannel)
    -> bool;

    /// ソケットを登録解除。ユーザーの最後のソケットだったなら `true`
    async fn unregister_socket(&self, user_id: &UserId, socket_id: &SocketId) -> bool;

    /// ユーザーの全ソケットに送信。送信できたソケット数を返す
    async fn push_to_user(&self, user_id: &UserId, content: &str)
    -> Result<usize, MessagePushError>;

    /// `exclude` 以外の全ユーザーに送信（一部の失敗は許容）
    async fn broadcast_except(&self, exclude: &UserId, content: &str);

    /// 接続中のユーザー
    async fn online_users(&self) -> Vec<UserId>;
}
