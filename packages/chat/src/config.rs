//! Configuration of the chat core.

use std::time::Duration;

use tabiji_shared::protocol::SOCKET_PATH;

use crate::connection::ReconnectPolicy;

const DEFAULT_ORIGIN: &str = "127.0.0.1:8080";

/// Tunables of the thread controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadConfig {
    /// Retries after the first failed history fetch.
    pub history_retries: u32,
    /// Retry `n` (1-based) waits `history_retry_step * n`.
    pub history_retry_step: Duration,
    /// Idle time after the last input before `typing=false` is sent.
    pub typing_idle: Duration,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            history_retries: 3,
            history_retry_step: Duration::from_millis(2000),
            typing_idle: Duration::from_millis(3000),
        }
    }
}

/// Endpoints and policies of one chat client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// REST origin, e.g. `http://127.0.0.1:8080`.
    pub api_base_url: String,
    /// WebSocket endpoint, e.g. `ws://127.0.0.1:8080/socket`.
    pub socket_url: String,
    pub reconnect: ReconnectPolicy,
    pub thread: ThreadConfig,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::with_endpoints(
            format!("http://{}", DEFAULT_ORIGIN),
            format!("ws://{}{}", DEFAULT_ORIGIN, SOCKET_PATH),
        )
    }
}

impl ChatConfig {
    /// Derive both endpoints from an `http(s)://` origin served by one backend.
    ///
    /// Returns `None` for other schemes.
    pub fn for_base_url(base_url: &str) -> Option<Self> {
        let base_url = base_url.trim_end_matches('/');
        let socket_origin = if let Some(rest) = base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            return None;
        };

        Some(Self::with_endpoints(
            base_url.to_string(),
            format!("{}{}", socket_origin, SOCKET_PATH),
        ))
    }

    pub fn with_endpoints(api_base_url: String, socket_url: String) -> Self {
        Self {
            api_base_url,
            socket_url,
            reconnect: ReconnectPolicy::default(),
            thread: ThreadConfig::default(),
        }
    }
}
