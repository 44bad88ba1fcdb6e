//! Transport connector trait 定義
//!
//! Connection manager は具体的な WebSocket 実装に依存せず、この trait を通じて
//! 認証済みの接続を開く。接続はチャンネルの組として表現される。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ChatEvent, OutboundEvent, TransportError};

/// Lifecycle and payload events read from an open transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Event(ChatEvent),
    /// Transport-level error; the connection is unusable afterwards.
    Error(String),
    /// The peer closed the connection.
    Closed(Option<String>),
}

/// Frames written to an open transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Emit(OutboundEvent),
    Close,
}

/// An open, authenticated transport connection.
///
/// Dropping `outbound` closes the write side; the inbound channel ends with a
/// `Closed` or `Error` event once the connection is gone.
#[derive(Debug)]
pub struct TransportHandle {
    pub outbound: mpsc::UnboundedSender<OutboundFrame>,
    pub inbound: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Opens transport connections authenticated with a bearer credential.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, token: &str) -> Result<TransportHandle, TransportError>;
}
