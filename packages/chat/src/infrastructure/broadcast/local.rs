//! In-process cross-tab bus
//!
//! ## 概要
//!
//! `tokio::sync::broadcast` を使った `CrossTabBus` 実装。同一プロセス内の複数タブ
//! （connection manager）が同じ `LocalBroadcastBus` を共有することで、1 つのタブが
//! 受信したイベントを他のタブに複製する。
//!
//! ブラウザの BroadcastChannel と同様に、送信元のタブ自身にはイベントは届かない。

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio::sync::broadcast;

use crate::domain::{BroadcastError, ChatEvent, CrossTabBus, CrossTabChannel, TabEnvelope, TabId};

/// Envelopes buffered per channel before slow subscribers start lagging.
const DEFAULT_CAPACITY: usize = 256;

/// Shared in-process bus. Cloning shares the underlying channels.
#[derive(Clone)]
pub struct LocalBroadcastBus {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<TabEnvelope>>>>,
    capacity: usize,
}

impl LocalBroadcastBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity,
        }
    }

    fn sender(&self, channel: &str) -> broadcast::Sender<TabEnvelope> {
        let mut channels = self
            .channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Subscribe `tab` to `channel`. Envelopes published by `tab` itself are skipped.
    pub fn subscribe(&self, channel: &str, tab: &TabId) -> TabSubscription {
        TabSubscription {
            tab: tab.clone(),
            receiver: self.sender(channel).subscribe(),
        }
    }
}

impl Default for LocalBroadcastBus {
    fn default() -> Self {
        Self::new()
    }
}

impl CrossTabBus for LocalBroadcastBus {
    fn open(&self, channel: &str, tab: &TabId) -> Box<dyn CrossTabChannel> {
        Box::new(LocalTabChannel {
            name: channel.to_string(),
            origin: tab.clone(),
            sender: self.sender(channel),
            closed: AtomicBool::new(false),
        })
    }
}

/// Publishing handle of one tab.
struct LocalTabChannel {
    name: String,
    origin: TabId,
    sender: broadcast::Sender<TabEnvelope>,
    closed: AtomicBool,
}

impl CrossTabChannel for LocalTabChannel {
    fn publish(&self, event: &ChatEvent) -> Result<(), BroadcastError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BroadcastError::Closed(self.name.clone()));
        }
        let envelope = TabEnvelope {
            origin: self.origin.clone(),
            event: event.clone(),
        };
        // 購読者がいない場合も失敗とはみなさない
        match self.sender.send(envelope) {
            Ok(receivers) => tracing::trace!("Mirrored event to {} subscribers", receivers),
            Err(_) => tracing::trace!("No sibling tab listening on '{}'", self.name),
        }
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// A tab's view of a channel.
pub struct TabSubscription {
    tab: TabId,
    receiver: broadcast::Receiver<TabEnvelope>,
}

impl TabSubscription {
    /// Next event published by another tab. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<ChatEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) if envelope.origin == self.tab => continue,
                Ok(envelope) => return Some(envelope.event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Cross-tab subscriber lagged, {} events skipped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
