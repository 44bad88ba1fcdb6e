//! WebSocket を使った Connector 実装
//!
//! ## 責務
//!
//! - bearer token をクエリパラメータに付けて WebSocket 接続を開く
//! - 受信フレームをドメインイベントに正規化して inbound チャンネルへ流す
//! - outbound チャンネルのイベントを JSON フレームとして送信する
//!
//! 再接続は行わない。接続断は `TransportEvent::Closed` / `Error` として通知し、
//! 再接続の判断は connection manager に任せる。

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use tabiji_shared::protocol::TOKEN_QUERY_PARAM;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, protocol::Message},
};

use crate::{
    domain::{Connector, OutboundFrame, TransportError, TransportEvent, TransportHandle},
    infrastructure::dto::{decode_server_frame, encode_client_frame},
};

/// Connector opening a WebSocket to the chat backend.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    socket_url: String,
}

impl WebSocketConnector {
    /// # 引数
    ///
    /// - `socket_url`: WebSocket エンドポイント（例: `ws://127.0.0.1:8080/socket`）
    pub fn new(socket_url: impl Into<String>) -> Self {
        Self {
            socket_url: socket_url.into(),
        }
    }
}

/// Append the credential to the socket URL as a query parameter.
pub fn authenticated_url(socket_url: &str, token: &str) -> Result<Url, TransportError> {
    let mut url =
        Url::parse(socket_url).map_err(|_| TransportError::InvalidEndpoint(socket_url.into()))?;
    url.query_pairs_mut().append_pair(TOKEN_QUERY_PARAM, token);
    Ok(url)
}

fn classify_connect_error(error: tungstenite::Error) -> TransportError {
    match error {
        tungstenite::Error::Http(response) => TransportError::Rejected(response.status().as_u16()),
        other => TransportError::Connect(other.to_string()),
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn open(&self, token: &str) -> Result<TransportHandle, TransportError> {
        let url = authenticated_url(&self.socket_url, token)?;
        let (ws_stream, _response) = connect_async(url.as_str())
            .await
            .map_err(classify_connect_error)?;
        tracing::debug!("WebSocket handshake with {} completed", self.socket_url);

        let (mut write, mut read) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<OutboundFrame>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<TransportEvent>();

        // outbound: チャンネルが閉じるか Close を受け取るまで書き込み続ける
        tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                let event = match frame {
                    OutboundFrame::Emit(event) => event,
                    OutboundFrame::Close => break,
                };
                let json = match encode_client_frame(event) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!("Failed to serialize outbound event: {}", e);
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::Text(json.into())).await {
                    tracing::warn!("Failed to write to WebSocket: {}", e);
                    break;
                }
            }
            if let Err(e) = write.send(Message::Close(None)).await {
                tracing::debug!("Close frame not sent: {}", e);
            }
        });

        // inbound: 受信フレームを正規化して manager に渡す
        tokio::spawn(async move {
            while let Some(message) = read.next().await {
                let event = match message {
                    Ok(Message::Text(text)) => match decode_server_frame(text.as_str()) {
                        Ok(event) => TransportEvent::Event(event),
                        Err(e) => {
                            tracing::warn!("Dropping undecodable frame: {}", e);
                            continue;
                        }
                    },
                    Ok(Message::Close(frame)) => {
                        let reason = frame.map(|f| f.reason.as_str().to_owned());
                        let _ = inbound_tx.send(TransportEvent::Closed(reason));
                        return;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        let _ = inbound_tx.send(TransportEvent::Error(e.to_string()));
                        return;
                    }
                };
                if inbound_tx.send(event).is_err() {
                    // manager が接続を手放した
                    return;
                }
            }
            let _ = inbound_tx.send(TransportEvent::Closed(None));
        });

        Ok(TransportHandle {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}
