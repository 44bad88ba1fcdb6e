//! Cross-tab bus trait 定義
//!
//! 同一ブラウザ内の他のタブへイベントを複製するための publish/subscribe。
//! ベストエフォートであり、タブ間の順序は保証しない。

use super::{BroadcastError, ChatEvent, TabId};

/// Name of the channel chat events are mirrored on.
pub const CHAT_EVENTS_CHANNEL: &str = "chat-events";

/// An event as it travels between tabs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabEnvelope {
    /// Tab whose transport received the event.
    pub origin: TabId,
    pub event: ChatEvent,
}

/// A tab's publishing handle on a named channel.
pub trait CrossTabChannel: Send + Sync {
    fn publish(&self, event: &ChatEvent) -> Result<(), BroadcastError>;

    /// Release the handle. Later publishes fail with [`BroadcastError::Closed`].
    fn close(&self);
}

/// Same-origin publish/subscribe bus shared by all tabs.
pub trait CrossTabBus: Send + Sync {
    fn open(&self, channel: &str, tab: &TabId) -> Box<dyn CrossTabChannel>;
}
