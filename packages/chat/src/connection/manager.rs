//! Connection manager: the one real-time connection of a tab.
//!
//! ## 責務
//!
//! - 認証済みの transport 接続を 1 タブにつき最大 1 本だけ維持する
//! - 受信イベントを登録済みの 1 つのコールバックへ受信順に配送する
//! - 同じイベントを cross-tab bus に publish して他のタブと同期する
//! - 予期しない切断時に指数バックオフで再接続する（上限回数あり）
//!
//! ## 設計ノート
//!
//! 接続は「世代」(generation) 単位で管理する。`connect()` のたびに世代を進め、
//! 世代ごとに 1 つの driver タスクが接続・受信・再接続を順に行う。古い世代の
//! driver は共有状態を変更しない。状態は `std::sync::Mutex` で保護し、ロックを
//! 保持したまま `.await` しない。

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::domain::{
    CHAT_EVENTS_CHANNEL, ChatError, ChatEvent, Connector, CredentialStore, CrossTabBus,
    CrossTabChannel, OutboundEvent, OutboundFrame, TabId, TransportEvent, TransportHandle,
    UserId,
};

use super::{
    backoff::{ReconnectPolicy, Sleeper, TokioSleeper},
    state::{ConnectionState, DisconnectReason},
};

/// The single subscriber inbound events are delivered to.
pub type EventCallback = Arc<dyn Fn(ChatEvent) + Send + Sync>;

/// Outbound side of the connection as seen by controllers.
///
/// Sends are fire-and-forget: they never fail loudly. The returned flag tells
/// whether the event was handed to a live transport, so callers can roll back
/// optimistic state.
pub trait ChatLink: Send + Sync {
    fn send_message(&self, receiver_id: &UserId, content: &str) -> bool;
    fn send_typing(&self, receiver_id: &UserId, is_typing: bool) -> bool;
    fn state(&self) -> ConnectionState;
}

/// Owns the transport connection of one tab.
///
/// Cloning is cheap and shares the same connection; controllers receive a
/// clone (or an `Arc<dyn ChatLink>`) at construction time.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

struct Inner {
    tab_id: TabId,
    policy: ReconnectPolicy,
    credentials: Arc<dyn CredentialStore>,
    connector: Arc<dyn Connector>,
    sleeper: Arc<dyn Sleeper>,
    bus: Option<Arc<dyn CrossTabBus>>,
    state_tx: watch::Sender<ConnectionState>,
    session: Mutex<Session>,
}

#[derive(Default)]
struct Session {
    generation: u64,
    callback: Option<EventCallback>,
    outbound: Option<mpsc::UnboundedSender<OutboundFrame>>,
    broadcast: Option<Arc<dyn CrossTabChannel>>,
    manual_disconnect: bool,
    attempts: u32,
    driver: Option<JoinHandle<()>>,
    leases: usize,
}

impl Session {
    /// Release the transport, the cross-tab handle and the driver of the current generation.
    fn teardown(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
        if let Some(outbound) = self.outbound.take() {
            let _ = outbound.send(OutboundFrame::Close);
        }
        if let Some(channel) = self.broadcast.take() {
            channel.close();
        }
    }
}

/// Builder for [`ConnectionManager`].
pub struct ConnectionManagerBuilder {
    credentials: Arc<dyn CredentialStore>,
    connector: Arc<dyn Connector>,
    policy: ReconnectPolicy,
    sleeper: Arc<dyn Sleeper>,
    bus: Option<Arc<dyn CrossTabBus>>,
    tab_id: TabId,
}

impl ConnectionManagerBuilder {
    pub fn policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Mirror inbound events to sibling tabs on `bus`.
    pub fn cross_tab(mut self, bus: Arc<dyn CrossTabBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn tab_id(mut self, tab_id: TabId) -> Self {
        self.tab_id = tab_id;
        self
    }

    pub fn build(self) -> ConnectionManager {
        let (state_tx, _) = watch::channel(ConnectionState::Idle);
        ConnectionManager {
            inner: Arc::new(Inner {
                tab_id: self.tab_id,
                policy: self.policy,
                credentials: self.credentials,
                connector: self.connector,
                sleeper: self.sleeper,
                bus: self.bus,
                state_tx,
                session: Mutex::new(Session::default()),
            }),
        }
    }
}

impl ConnectionManager {
    /// Manager with the default reconnect policy and no cross-tab mirroring.
    pub fn new(credentials: Arc<dyn CredentialStore>, connector: Arc<dyn Connector>) -> Self {
        Self::builder(credentials, connector).build()
    }

    pub fn builder(
        credentials: Arc<dyn CredentialStore>,
        connector: Arc<dyn Connector>,
    ) -> ConnectionManagerBuilder {
        ConnectionManagerBuilder {
            credentials,
            connector,
            policy: ReconnectPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
            bus: None,
            tab_id: TabId::generate(),
        }
    }

    /// Open the connection and register `on_event` as the subscriber.
    ///
    /// Returns immediately when a connection is already connecting, connected
    /// or reconnecting; the existing subscriber stays registered. The transport
    /// is opened in the background; watch [`Self::subscribe_state`] for the outcome.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// [`ChatError::Unauthenticated`] when no credential is present.
    pub fn connect(&self, on_event: EventCallback) -> Result<(), ChatError> {
        let mut session = self.inner.lock_session();

        let state = self.state();
        if state.is_active() {
            tracing::debug!("connect() ignored, connection is {:?}", state);
            return Ok(());
        }

        let token = self
            .inner
            .credentials
            .auth_token()
            .ok_or(ChatError::Unauthenticated)?;

        session.teardown();
        session.generation += 1;
        session.manual_disconnect = false;
        session.attempts = 0;
        session.callback = Some(on_event);
        session.broadcast = self
            .inner
            .bus
            .as_ref()
            .map(|bus| Arc::from(bus.open(CHAT_EVENTS_CHANNEL, &self.inner.tab_id)));

        self.inner.set_state(ConnectionState::Connecting);
        let generation = session.generation;
        tracing::info!(
            "Connecting tab {} (generation {})",
            self.inner.tab_id.as_str(),
            generation
        );
        session.driver = Some(tokio::spawn(drive(
            Arc::clone(&self.inner),
            generation,
            token,
        )));

        Ok(())
    }

    /// Close the connection for good and stop automatic reconnection.
    ///
    /// Safe to call any number of times.
    pub fn disconnect(&self) {
        let mut session = self.inner.lock_session();
        session.manual_disconnect = true;
        session.teardown();
        session.callback = None;

        if self.state() != ConnectionState::Idle {
            self.inner
                .set_state(ConnectionState::Disconnected(DisconnectReason::Manual));
            tracing::info!("Disconnected tab {}", self.inner.tab_id.as_str());
        }
    }

    /// Take a lease on the connection. Dropping the last lease disconnects.
    pub fn acquire(&self) -> ConnectionLease {
        self.inner.lock_session().leases += 1;
        ConnectionLease {
            manager: self.clone(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    pub fn tab_id(&self) -> &TabId {
        &self.inner.tab_id
    }

    /// Automatic attempts made since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.lock_session().attempts
    }

    fn emit(&self, event: OutboundEvent) -> bool {
        let session = self.inner.lock_session();
        match session.outbound.as_ref() {
            Some(outbound) => outbound.send(OutboundFrame::Emit(event)).is_ok(),
            None => {
                tracing::debug!("Not connected, dropping outbound event");
                false
            }
        }
    }
}

impl ChatLink for ConnectionManager {
    fn send_message(&self, receiver_id: &UserId, content: &str) -> bool {
        self.emit(OutboundEvent::SendMessage {
            receiver_id: receiver_id.clone(),
            content: content.to_string(),
        })
    }

    fn send_typing(&self, receiver_id: &UserId, is_typing: bool) -> bool {
        self.emit(OutboundEvent::Typing {
            receiver_id: receiver_id.clone(),
            is_typing,
        })
    }

    fn state(&self) -> ConnectionState {
        ConnectionManager::state(self)
    }
}

/// Keeps the shared connection open while held.
pub struct ConnectionLease {
    manager: ConnectionManager,
}

impl ConnectionLease {
    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }
}

impl Drop for ConnectionLease {
    fn drop(&mut self) {
        let last = {
            let mut session = self.manager.inner.lock_session();
            session.leases = session.leases.saturating_sub(1);
            session.leases == 0
        };
        if last {
            tracing::debug!("Last connection lease released");
            self.manager.disconnect();
        }
    }
}

impl Inner {
    fn lock_session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }

    /// Adopt a freshly opened transport. Returns `false` when this generation is obsolete.
    fn on_opened(&self, generation: u64, outbound: mpsc::UnboundedSender<OutboundFrame>) -> bool {
        let mut session = self.lock_session();
        if session.generation != generation || session.manual_disconnect {
            let _ = outbound.send(OutboundFrame::Close);
            return false;
        }
        session.attempts = 0;
        session.outbound = Some(outbound);
        self.set_state(ConnectionState::Connected);
        tracing::info!("Connected to chat server");
        true
    }

    /// Forget the lost transport. Returns `true` when reconnection should follow.
    fn on_lost(&self, generation: u64, reason: &str) -> bool {
        let mut session = self.lock_session();
        if session.generation != generation {
            return false;
        }
        session.outbound = None;
        if session.manual_disconnect {
            return false;
        }
        tracing::warn!("Connection lost: {}", reason);
        true
    }

    /// Book the next automatic attempt, or give up.
    fn schedule_reconnect(&self, generation: u64) -> Option<(u32, Duration)> {
        let mut session = self.lock_session();
        if session.generation != generation || session.manual_disconnect {
            return None;
        }
        if !self.policy.should_attempt_reconnect(session.attempts) {
            tracing::error!(
                "Failed to reconnect after {} attempts. Giving up.",
                session.attempts
            );
            self.set_state(ConnectionState::Disconnected(
                DisconnectReason::RetriesExhausted,
            ));
            return None;
        }
        session.attempts += 1;
        let attempt = session.attempts;
        self.set_state(ConnectionState::Reconnecting { attempt });
        Some((attempt, self.policy.next_delay(attempt)))
    }

    /// Re-read the credential before an automatic attempt.
    fn token_for_retry(&self, generation: u64) -> Option<String> {
        let session = self.lock_session();
        if session.generation != generation || session.manual_disconnect {
            return None;
        }
        let token = self.credentials.auth_token();
        if token.is_none() {
            tracing::warn!("Credential disappeared, not reconnecting");
            self.set_state(ConnectionState::Disconnected(
                DisconnectReason::Unauthenticated,
            ));
        }
        token
    }

    /// Deliver one inbound event locally, then mirror it to sibling tabs.
    fn dispatch(&self, generation: u64, event: ChatEvent) {
        let callback = {
            let session = self.lock_session();
            if session.generation != generation {
                return;
            }
            session.callback.clone()
        };

        // コールバックはロックの外で呼ぶ（コールバック内から send_* できるように）
        if let Some(callback) = callback {
            callback(event.clone());
        }

        let broadcast = {
            let session = self.lock_session();
            if session.generation != generation {
                return;
            }
            session.broadcast.clone()
        };
        if let Some(channel) = broadcast
            && let Err(e) = channel.publish(&event)
        {
            tracing::warn!("Failed to mirror '{}' to other tabs: {}", event.name(), e);
        }
    }

    /// Read the transport until it ends. Returns a description of why it ended.
    async fn pump(
        &self,
        generation: u64,
        inbound: &mut mpsc::UnboundedReceiver<TransportEvent>,
    ) -> String {
        while let Some(event) = inbound.recv().await {
            match event {
                TransportEvent::Event(event) => {
                    tracing::debug!("Received '{}' event", event.name());
                    self.dispatch(generation, event);
                }
                TransportEvent::Error(reason) => return format!("transport error: {}", reason),
                TransportEvent::Closed(reason) => {
                    return reason.unwrap_or_else(|| "closed by server".to_string());
                }
            }
        }
        "transport dropped".to_string()
    }
}

/// Connection driver of one generation: open, pump, back off, repeat.
async fn drive(inner: Arc<Inner>, generation: u64, mut token: String) {
    loop {
        match inner.connector.open(&token).await {
            Ok(TransportHandle {
                outbound,
                mut inbound,
            }) => {
                if !inner.on_opened(generation, outbound) {
                    return;
                }
                let reason = inner.pump(generation, &mut inbound).await;
                if !inner.on_lost(generation, &reason) {
                    return;
                }
            }
            Err(e) => tracing::warn!("Connection attempt failed: {}", e),
        }

        let Some((attempt, delay)) = inner.schedule_reconnect(generation) else {
            return;
        };
        tracing::info!(
            "Reconnecting in {} ms... (attempt {}/{})",
            delay.as_millis(),
            attempt,
            inner.policy.max_attempts
        );
        inner.sleeper.sleep(delay).await;

        match inner.token_for_retry(generation) {
            Some(fresh) => token = fresh,
            None => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{BroadcastError, Message, MessageId, Timestamp, TransportError},
        infrastructure::{broadcast::LocalBroadcastBus, credential::MemoryCredentialStore},
    };
    use async_trait::async_trait;
    use std::{
        collections::VecDeque,
        sync::atomic::{AtomicUsize, Ordering},
    };

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - connect の冪等性と認証チェック
    // - 受信イベントの配送順序と cross-tab への複製
    // - 再接続の遅延系列と上限、手動切断によるキャンセル
    // - 送信の fire-and-forget 契約と lease による解放
    //
    // 【どのようなシナリオをテストするか】
    // transport は FakeConnector で置き換え、テスト側が相手側のチャンネル
    // （FakePeer）を操作して切断・受信を再現する。
    // ========================================

    struct FakePeer {
        inbound: mpsc::UnboundedSender<TransportEvent>,
        outbound: mpsc::UnboundedReceiver<OutboundFrame>,
    }

    #[derive(Default)]
    struct FakeConnector {
        script: Mutex<VecDeque<Result<(), TransportError>>>,
        peers: Mutex<VecDeque<FakePeer>>,
        opens: AtomicUsize,
    }

    impl FakeConnector {
        fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Script the outcome of upcoming opens. Unscripted opens succeed.
        fn script(&self, outcomes: impl IntoIterator<Item = Result<(), TransportError>>) {
            self.script.lock().unwrap().extend(outcomes);
        }

        fn opens(&self) -> usize {
            self.opens.load(Ordering::SeqCst)
        }

        fn take_peer(&self) -> FakePeer {
            self.peers.lock().unwrap().pop_front().expect("no open peer")
        }
    }

    #[async_trait]
    impl Connector for FakeConnector {
        async fn open(&self, _token: &str) -> Result<TransportHandle, TransportError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            if let Some(Err(e)) = self.script.lock().unwrap().pop_front() {
                return Err(e);
            }
            let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
            let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
            self.peers.lock().unwrap().push_back(FakePeer {
                inbound: inbound_tx,
                outbound: outbound_rx,
            });
            Ok(TransportHandle {
                outbound: outbound_tx,
                inbound: inbound_rx,
            })
        }
    }

    /// Records requested delays and returns immediately.
    #[derive(Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
            tokio::task::yield_now().await;
        }
    }

    struct FailingChannel;

    impl CrossTabChannel for FailingChannel {
        fn publish(&self, _event: &ChatEvent) -> Result<(), BroadcastError> {
            Err(BroadcastError::PublishFailed("quota exceeded".to_string()))
        }

        fn close(&self) {}
    }

    struct FailingBus;

    impl CrossTabBus for FailingBus {
        fn open(&self, _channel: &str, _tab: &TabId) -> Box<dyn CrossTabChannel> {
            Box::new(FailingChannel)
        }
    }

    fn refused() -> Result<(), TransportError> {
        Err(TransportError::Connect("connection refused".to_string()))
    }

    fn signed_in() -> Arc<MemoryCredentialStore> {
        Arc::new(MemoryCredentialStore::with_token("token-alice"))
    }

    fn collecting_callback() -> (EventCallback, mpsc::UnboundedReceiver<ChatEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let callback: EventCallback = Arc::new(move |event| {
            let _ = tx.send(event);
        });
        (callback, rx)
    }

    async fn wait_for_state(
        manager: &ConnectionManager,
        predicate: impl FnMut(&ConnectionState) -> bool,
    ) {
        let mut rx = manager.subscribe_state();
        tokio::time::timeout(Duration::from_secs(120), rx.wait_for(predicate))
            .await
            .expect("timed out waiting for connection state")
            .expect("state channel closed");
    }

    fn typing(sender: &str, is_typing: bool) -> ChatEvent {
        ChatEvent::Typing {
            sender_id: UserId::new(sender).unwrap(),
            is_typing,
        }
    }

    fn new_message(id: &str) -> ChatEvent {
        ChatEvent::NewMessage(Message {
            id: MessageId::from_server(id).unwrap(),
            sender_id: UserId::new("bob").unwrap(),
            receiver_id: UserId::new("alice").unwrap(),
            content: "Hello".to_string(),
            created_at: Timestamp::new(1),
            is_read: false,
        })
    }

    #[tokio::test]
    async fn test_connect_without_credential_fails() {
        // テスト項目: credential がない場合 connect は Unauthenticated で失敗する
        // given (前提条件):
        let connector = FakeConnector::new();
        let manager =
            ConnectionManager::new(Arc::new(MemoryCredentialStore::new()), connector.clone());
        let (callback, _rx) = collecting_callback();

        // when (操作):
        let result = manager.connect(callback);

        // then (期待する結果):
        assert_eq!(result, Err(ChatError::Unauthenticated));
        assert_eq!(manager.state(), ConnectionState::Idle);
        assert_eq!(connector.opens(), 0);
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        // テスト項目: 接続中・接続済みの connect は 2 本目の接続を作らない
        // given (前提条件):
        let connector = FakeConnector::new();
        let manager = ConnectionManager::new(signed_in(), connector.clone());
        let (callback, _rx) = collecting_callback();

        // when (操作): 接続処理中に重複して呼び、接続後にも呼ぶ
        manager.connect(callback.clone()).unwrap();
        manager.connect(callback.clone()).unwrap();
        wait_for_state(&manager, ConnectionState::is_connected).await;
        manager.connect(callback.clone()).unwrap();
        manager.connect(callback).unwrap();
        tokio::task::yield_now().await;

        // then (期待する結果):
        assert_eq!(connector.opens(), 1);
        assert_eq!(manager.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_inbound_events_are_delivered_in_order_and_mirrored() {
        // テスト項目: 受信イベントが受信順にコールバックへ届き、他のタブにも複製される
        // given (前提条件):
        let connector = FakeConnector::new();
        let bus = LocalBroadcastBus::new();
        let manager = ConnectionManager::builder(signed_in(), connector.clone())
            .cross_tab(Arc::new(bus.clone()))
            .build();
        let sibling = TabId::generate();
        let mut sibling_subscription = bus.subscribe(CHAT_EVENTS_CHANNEL, &sibling);
        let mut own_subscription = bus.subscribe(CHAT_EVENTS_CHANNEL, manager.tab_id());
        let (callback, mut rx) = collecting_callback();
        manager.connect(callback).unwrap();
        wait_for_state(&manager, ConnectionState::is_connected).await;
        let peer = connector.take_peer();

        // when (操作):
        peer.inbound
            .send(TransportEvent::Event(typing("bob", true)))
            .unwrap();
        peer.inbound
            .send(TransportEvent::Event(new_message("m1")))
            .unwrap();

        // then (期待する結果):
        assert_eq!(rx.recv().await, Some(typing("bob", true)));
        assert_eq!(rx.recv().await, Some(new_message("m1")));
        assert_eq!(sibling_subscription.recv().await, Some(typing("bob", true)));
        assert_eq!(sibling_subscription.recv().await, Some(new_message("m1")));
        // 自タブには複製されない
        assert!(
            tokio::time::timeout(Duration::from_millis(50), own_subscription.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_affect_local_delivery() {
        // テスト項目: cross-tab への publish が失敗してもローカルのコールバックには届く
        // given (前提条件):
        let connector = FakeConnector::new();
        let manager = ConnectionManager::builder(signed_in(), connector.clone())
            .cross_tab(Arc::new(FailingBus))
            .build();
        let (callback, mut rx) = collecting_callback();
        manager.connect(callback).unwrap();
        wait_for_state(&manager, ConnectionState::is_connected).await;
        let peer = connector.take_peer();

        // when (操作):
        peer.inbound
            .send(TransportEvent::Event(new_message("m1")))
            .unwrap();
        peer.inbound
            .send(TransportEvent::Event(new_message("m2")))
            .unwrap();

        // then (期待する結果):
        assert_eq!(rx.recv().await, Some(new_message("m1")));
        assert_eq!(rx.recv().await, Some(new_message("m2")));
        assert_eq!(manager.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_reconnect_delays_follow_backoff_then_give_up() {
        // テスト項目: 予期しない切断後、1s,2s,4s,8s,16s の遅延で 5 回再接続し、その後は諦める
        // given (前提条件):
        let connector = FakeConnector::new();
        let sleeper = Arc::new(RecordingSleeper::default());
        let manager = ConnectionManager::builder(signed_in(), connector.clone())
            .sleeper(sleeper.clone())
            .build();
        let (callback, _rx) = collecting_callback();
        manager.connect(callback).unwrap();
        wait_for_state(&manager, ConnectionState::is_connected).await;
        // 初回接続以降の 5 回はすべて失敗する
        connector.script(std::iter::repeat_with(refused).take(5));

        // when (操作): サーバーが接続を切る
        let peer = connector.take_peer();
        peer.inbound.send(TransportEvent::Closed(None)).unwrap();
        wait_for_state(&manager, |state| {
            *state == ConnectionState::Disconnected(DisconnectReason::RetriesExhausted)
        })
        .await;

        // then (期待する結果):
        let delays: Vec<u128> = sleeper
            .delays
            .lock()
            .unwrap()
            .iter()
            .map(Duration::as_millis)
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000]);
        assert_eq!(connector.opens(), 6);
        assert_eq!(manager.reconnect_attempts(), 5);
    }

    #[tokio::test]
    async fn test_initial_connect_failure_is_retried() {
        // テスト項目: 初回の接続失敗（不正な credential 等）も再接続ポリシーで扱われる
        // given (前提条件):
        let connector = FakeConnector::new();
        connector.script([Err(TransportError::Rejected(401)), refused()]);
        let sleeper = Arc::new(RecordingSleeper::default());
        let manager = ConnectionManager::builder(signed_in(), connector.clone())
            .sleeper(sleeper.clone())
            .build();
        let (callback, _rx) = collecting_callback();

        // when (操作):
        manager.connect(callback).unwrap();
        wait_for_state(&manager, ConnectionState::is_connected).await;

        // then (期待する結果): 2 回失敗した後 3 回目で接続し、試行回数はリセットされる
        assert_eq!(connector.opens(), 3);
        assert_eq!(
            *sleeper.delays.lock().unwrap(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
        assert_eq!(manager.reconnect_attempts(), 0);
    }

    #[tokio::test]
    async fn test_callback_is_reused_after_reconnect() {
        // テスト項目: 再接続後も同じコールバックにイベントが届く
        // given (前提条件):
        let connector = FakeConnector::new();
        let manager = ConnectionManager::builder(signed_in(), connector.clone())
            .sleeper(Arc::new(RecordingSleeper::default()))
            .build();
        let (callback, mut rx) = collecting_callback();
        manager.connect(callback).unwrap();
        wait_for_state(&manager, ConnectionState::is_connected).await;
        let first = connector.take_peer();

        // when (操作):
        first
            .inbound
            .send(TransportEvent::Error("reset by peer".to_string()))
            .unwrap();
        wait_for_state(&manager, |_| connector.opens() == 2).await;
        wait_for_state(&manager, ConnectionState::is_connected).await;
        let second = connector.take_peer();
        second
            .inbound
            .send(TransportEvent::Event(new_message("m9")))
            .unwrap();

        // then (期待する結果):
        assert_eq!(rx.recv().await, Some(new_message("m9")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_cancels_pending_reconnect() {
        // テスト項目: 再接続待ちの間に disconnect すると、それ以降の試行は行われない
        // given (前提条件):
        let connector = FakeConnector::new();
        connector.script([refused()]);
        let manager = ConnectionManager::new(signed_in(), connector.clone());
        let (callback, _rx) = collecting_callback();
        manager.connect(callback).unwrap();
        wait_for_state(&manager, |state| {
            *state == ConnectionState::Reconnecting { attempt: 1 }
        })
        .await;

        // when (操作):
        manager.disconnect();
        tokio::time::sleep(Duration::from_secs(120)).await;

        // then (期待する結果):
        assert_eq!(connector.opens(), 1);
        assert_eq!(
            manager.state(),
            ConnectionState::Disconnected(DisconnectReason::Manual)
        );
    }

    #[tokio::test]
    async fn test_disconnect_closes_transport_and_is_idempotent() {
        // テスト項目: disconnect は transport を閉じ、複数回呼んでも安全
        // given (前提条件):
        let connector = FakeConnector::new();
        let manager = ConnectionManager::new(signed_in(), connector.clone());
        let (callback, _rx) = collecting_callback();
        manager.connect(callback).unwrap();
        wait_for_state(&manager, ConnectionState::is_connected).await;
        let mut peer = connector.take_peer();

        // when (操作):
        manager.disconnect();
        manager.disconnect();

        // then (期待する結果):
        assert_eq!(peer.outbound.recv().await, Some(OutboundFrame::Close));
        assert_eq!(
            manager.state(),
            ConnectionState::Disconnected(DisconnectReason::Manual)
        );
        assert!(!manager.send_message(&UserId::new("bob").unwrap(), "late"));
        assert_eq!(connector.opens(), 1);
    }

    #[tokio::test]
    async fn test_send_is_noop_when_disconnected_and_emitted_when_connected() {
        // テスト項目: 未接続時の送信は黙って false を返し、接続中は transport に書き込まれる
        // given (前提条件):
        let connector = FakeConnector::new();
        let manager = ConnectionManager::new(signed_in(), connector.clone());
        let bob = UserId::new("bob").unwrap();

        // when (操作): 未接続で送信
        let before = manager.send_message(&bob, "too early");

        // then (期待する結果):
        assert!(!before);

        // when (操作): 接続後に送信
        let (callback, _rx) = collecting_callback();
        manager.connect(callback).unwrap();
        wait_for_state(&manager, ConnectionState::is_connected).await;
        let mut peer = connector.take_peer();
        let sent = manager.send_message(&bob, "Hello");
        let typed = manager.send_typing(&bob, true);

        // then (期待する結果):
        assert!(sent);
        assert!(typed);
        assert_eq!(
            peer.outbound.recv().await,
            Some(OutboundFrame::Emit(OutboundEvent::SendMessage {
                receiver_id: bob.clone(),
                content: "Hello".to_string(),
            }))
        );
        assert_eq!(
            peer.outbound.recv().await,
            Some(OutboundFrame::Emit(OutboundEvent::Typing {
                receiver_id: bob,
                is_typing: true,
            }))
        );
    }

    #[tokio::test]
    async fn test_reconnect_stops_when_credential_is_removed() {
        // テスト項目: 再接続前に credential が消えていれば Unauthenticated で停止する
        // given (前提条件):
        let connector = FakeConnector::new();
        let credentials = signed_in();
        let manager = ConnectionManager::builder(credentials.clone(), connector.clone())
            .sleeper(Arc::new(RecordingSleeper::default()))
            .build();
        let (callback, _rx) = collecting_callback();
        manager.connect(callback).unwrap();
        wait_for_state(&manager, ConnectionState::is_connected).await;
        let peer = connector.take_peer();

        // when (操作): サインアウト後に切断される
        credentials.clear();
        peer.inbound.send(TransportEvent::Closed(None)).unwrap();
        wait_for_state(&manager, |state| {
            *state == ConnectionState::Disconnected(DisconnectReason::Unauthenticated)
        })
        .await;

        // then (期待する結果):
        assert_eq!(connector.opens(), 1);
    }

    #[tokio::test]
    async fn test_manual_retry_after_giving_up_starts_fresh() {
        // テスト項目: 再接続を諦めた後の connect は試行回数をリセットして新たに接続する
        // given (前提条件):
        let connector = FakeConnector::new();
        connector.script(std::iter::repeat_with(refused).take(6));
        let manager = ConnectionManager::builder(signed_in(), connector.clone())
            .sleeper(Arc::new(RecordingSleeper::default()))
            .build();
        let (callback, _rx) = collecting_callback();
        manager.connect(callback.clone()).unwrap();
        wait_for_state(&manager, |state| {
            *state == ConnectionState::Disconnected(DisconnectReason::RetriesExhausted)
        })
        .await;

        // when (操作):
        manager.connect(callback).unwrap();
        wait_for_state(&manager, ConnectionState::is_connected).await;

        // then (期待する結果):
        assert_eq!(connector.opens(), 7);
        assert_eq!(manager.reconnect_attempts(), 0);
    }

    #[tokio::test]
    async fn test_last_lease_drop_disconnects() {
        // テスト項目: 最後の lease が解放されたときだけ切断される
        // given (前提条件):
        let connector = FakeConnector::new();
        let manager = ConnectionManager::new(signed_in(), connector.clone());
        let list_lease = manager.acquire();
        let thread_lease = manager.acquire();
        let (callback, _rx) = collecting_callback();
        manager.connect(callback).unwrap();
        wait_for_state(&manager, ConnectionState::is_connected).await;

        // when (操作) / then (期待する結果):
        drop(thread_lease);
        assert_eq!(manager.state(), ConnectionState::Connected);
        drop(list_lease);
        assert_eq!(
            manager.state(),
            ConnectionState::Disconnected(DisconnectReason::Manual)
        );
    }
}
