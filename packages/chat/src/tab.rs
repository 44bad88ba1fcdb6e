//! One tab: a connection manager with both controllers wired to it.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{
    ChatConfig,
    connection::{ConnectionLease, ConnectionManager, ConnectionState, EventCallback},
    controller::{ConversationListController, ThreadController},
    domain::{CHAT_EVENTS_CHANNEL, ChatError, ChatEvent, CredentialStore, UserId},
    infrastructure::{
        api::HttpChatApi,
        broadcast::{LocalBroadcastBus, TabSubscription},
        transport::WebSocketConnector,
    },
};

/// Where an event routed to the controllers came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOrigin {
    /// Received on this tab's own transport.
    Transport,
    /// Mirrored by a sibling tab over the cross-tab bus.
    SiblingTab,
}

pub struct ChatTab {
    pub manager: ConnectionManager,
    pub list: ConversationListController,
    pub thread: ThreadController,
    events_tx: mpsc::UnboundedSender<ChatEvent>,
    events_rx: mpsc::UnboundedReceiver<ChatEvent>,
    mirrored: Option<TabSubscription>,
    _lease: ConnectionLease,
}

impl ChatTab {
    /// Wire a tab against the backend described by `config`.
    ///
    /// With a `bus`, inbound events are mirrored to and received from sibling tabs.
    pub fn new(
        config: &ChatConfig,
        me: UserId,
        credentials: Arc<dyn CredentialStore>,
        bus: Option<LocalBroadcastBus>,
    ) -> Self {
        let mut builder = ConnectionManager::builder(
            Arc::clone(&credentials),
            Arc::new(WebSocketConnector::new(config.socket_url.clone())),
        )
        .policy(config.reconnect.clone());
        if let Some(bus) = &bus {
            builder = builder.cross_tab(Arc::new(bus.clone()));
        }
        let manager = builder.build();

        let api = Arc::new(HttpChatApi::new(config.api_base_url.clone()));
        let list = ConversationListController::new(api.clone(), Arc::clone(&credentials));
        let thread = ThreadController::new(
            me,
            Arc::new(manager.clone()),
            api,
            credentials,
            config.thread.clone(),
        );
        let mirrored = bus.map(|bus| bus.subscribe(CHAT_EVENTS_CHANNEL, manager.tab_id()));
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            _lease: manager.acquire(),
            manager,
            list,
            thread,
            events_tx,
            events_rx,
            mirrored,
        }
    }

    /// Open this tab's own transport connection.
    pub fn connect(&self) -> Result<(), ChatError> {
        let events_tx = self.events_tx.clone();
        let callback: EventCallback = Arc::new(move |event| {
            let _ = events_tx.send(event);
        });
        self.manager.connect(callback)
    }

    pub fn state(&self) -> ConnectionState {
        self.manager.state()
    }

    /// Next inbound event, from the own transport or a sibling tab.
    pub async fn next_event(&mut self) -> Option<(EventOrigin, ChatEvent)> {
        tokio::select! {
            Some(event) = self.events_rx.recv() => Some((EventOrigin::Transport, event)),
            Some(event) = recv_mirrored(&mut self.mirrored) => Some((EventOrigin::SiblingTab, event)),
            else => None,
        }
    }

    /// Route an event to both controllers.
    pub async fn route(&mut self, event: &ChatEvent) -> Result<(), ChatError> {
        self.thread.handle_event(event);
        self.list.handle_event(event).await
    }
}

async fn recv_mirrored(subscription: &mut Option<TabSubscription>) -> Option<ChatEvent> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => std::future::pending().await,
    }
}
