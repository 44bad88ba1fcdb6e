//! Thread controller: the message thread with one counterpart.
//!
//! ## 責務
//!
//! - 相手とのメッセージ履歴を読み込む（失敗時は線形バックオフで再試行）
//! - 送信メッセージを一時 ID 付きで楽観的に表示し、送信失敗時は取り消す
//! - サーバーから確定メッセージが届いたら一時メッセージを置き換える
//! - 入力に応じた typing 通知と、相手の typing 状態を管理する
//!
//! ## 履歴読み込みの分割
//!
//! 読み込みは `begin_load` → `HistoryFetcher::fetch` → `apply_history` の 3 段階に
//! 分かれている。fetch は controller を借用しないため、表示側は fetch を別タスクで
//! 走らせながら入力やイベントを処理できる。相手の切り替え後に届いた古い結果は
//! `apply_history` が破棄する。

use std::sync::Arc;

use tabiji_shared::time::{Clock, SystemClock};

use crate::{
    config::ThreadConfig,
    connection::{ChatLink, ConnectionIndicator, Sleeper, TokioSleeper},
    domain::{
        ApiError, ChatApi, ChatError, ChatEvent, CredentialStore, DeliveryStatus, Message,
        MessageId, Timestamp, UserId,
    },
};

use super::typing::TypingDebouncer;

/// Notice shown when a send could not be dispatched.
pub const SEND_FAILED_NOTICE: &str = "Message could not be sent. Check your connection and try again.";

/// Lifecycle of the thread.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ThreadPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Sending,
    /// History could not be loaded after all retries.
    Failed(String),
}

/// Which side of the thread a message is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSide {
    Incoming,
    Outgoing,
}

/// An in-flight history load, tied to the counterpart and thread generation it was started for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub counterpart_id: UserId,
    generation: u64,
    token: String,
}

/// Fetches history without borrowing the controller.
#[derive(Clone)]
pub struct HistoryFetcher {
    api: Arc<dyn ChatApi>,
    sleeper: Arc<dyn Sleeper>,
    config: ThreadConfig,
}

impl HistoryFetcher {
    /// Fetch the history of `request`, oldest message first.
    ///
    /// Retries up to `history_retries` times after the first failure, waiting
    /// `history_retry_step * n` before retry `n`. A rejected credential is not retried.
    pub async fn fetch(&self, request: &HistoryRequest) -> Result<Vec<Message>, ChatError> {
        let mut retry = 0;
        loop {
            match self
                .api
                .fetch_history(&request.token, &request.counterpart_id)
                .await
            {
                Ok(mut messages) => {
                    // newest-first on the wire
                    messages.reverse();
                    return Ok(messages);
                }
                Err(ApiError::Unauthorized) => return Err(ChatError::Unauthenticated),
                Err(e) if retry < self.config.history_retries => {
                    retry += 1;
                    let delay = self.config.history_retry_step * retry;
                    tracing::warn!(
                        "Failed to load history with '{}': {}. Retrying in {} ms ({}/{})",
                        request.counterpart_id,
                        e,
                        delay.as_millis(),
                        retry,
                        self.config.history_retries
                    );
                    self.sleeper.sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(
                        "Giving up loading history with '{}': {}",
                        request.counterpart_id,
                        e
                    );
                    return Err(ChatError::FetchFailure(e.to_string()));
                }
            }
        }
    }
}

pub struct ThreadController {
    me: UserId,
    link: Arc<dyn ChatLink>,
    credentials: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    fetcher: HistoryFetcher,
    typing: TypingDebouncer,
    counterpart: Option<UserId>,
    generation: u64,
    messages: Vec<Message>,
    draft: String,
    phase: ThreadPhase,
    counterpart_typing: bool,
    notice: Option<String>,
}

impl ThreadController {
    /// # 引数
    ///
    /// - `me`: サインイン中のユーザー
    /// - `link`: 共有の connection manager
    pub fn new(
        me: UserId,
        link: Arc<dyn ChatLink>,
        api: Arc<dyn ChatApi>,
        credentials: Arc<dyn CredentialStore>,
        config: ThreadConfig,
    ) -> Self {
        let typing = TypingDebouncer::new(Arc::clone(&link), config.typing_idle);
        Self {
            me,
            link,
            credentials,
            clock: Arc::new(SystemClock),
            fetcher: HistoryFetcher {
                api,
                sleeper: Arc::new(TokioSleeper),
                config,
            },
            typing,
            counterpart: None,
            generation: 0,
            messages: Vec::new(),
            draft: String::new(),
            phase: ThreadPhase::Idle,
            counterpart_typing: false,
            notice: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.fetcher.sleeper = sleeper;
        self
    }

    /// Switch to the thread with `counterpart_id`.
    ///
    /// Clears the thread and invalidates any history load still in flight.
    pub fn open(&mut self, counterpart_id: UserId) {
        tracing::debug!("Opening thread with '{}'", counterpart_id);
        self.typing.cancel();
        self.counterpart = Some(counterpart_id);
        self.generation += 1;
        self.messages.clear();
        self.draft.clear();
        self.phase = ThreadPhase::Idle;
        self.counterpart_typing = false;
        self.notice = None;
    }

    /// Start a history load for the active counterpart.
    pub fn begin_load(&mut self) -> Result<HistoryRequest, ChatError> {
        let counterpart_id = self.counterpart.clone().ok_or(ChatError::InvalidTarget)?;
        let token = self
            .credentials
            .auth_token()
            .ok_or(ChatError::Unauthenticated)?;

        self.phase = ThreadPhase::Loading;
        Ok(HistoryRequest {
            counterpart_id,
            generation: self.generation,
            token,
        })
    }

    pub fn fetcher(&self) -> HistoryFetcher {
        self.fetcher.clone()
    }

    /// Apply the outcome of a history load. Outcomes of obsolete requests are dropped.
    pub fn apply_history(
        &mut self,
        request: &HistoryRequest,
        outcome: Result<Vec<Message>, ChatError>,
    ) -> Result<(), ChatError> {
        if request.generation != self.generation
            || self.counterpart.as_ref() != Some(&request.counterpart_id)
        {
            tracing::debug!(
                "Dropping stale history of '{}' (generation {})",
                request.counterpart_id,
                request.generation
            );
            return Ok(());
        }

        match outcome {
            Ok(history) => {
                // 読み込み中に届いたメッセージや送信中のメッセージは残す。
                // 履歴側で既に確定済みの一時メッセージは捨てる（確定 1 件につき 1 件まで）
                let mut claimed = vec![false; history.len()];
                let arrived: Vec<Message> = std::mem::take(&mut self.messages)
                    .into_iter()
                    .filter(|message| !history.iter().any(|h| h.id == message.id))
                    .filter(|message| {
                        let confirmed = history
                            .iter()
                            .enumerate()
                            .rev()
                            .find(|(i, h)| !claimed[*i] && message.is_confirmed_by(h))
                            .map(|(i, _)| i);
                        match confirmed {
                            Some(i) => {
                                claimed[i] = true;
                                false
                            }
                            None => true,
                        }
                    })
                    .collect();
                self.messages = history;
                for message in arrived {
                    self.reconcile(message);
                }
                self.phase = ThreadPhase::Ready;
                Ok(())
            }
            Err(e) => {
                self.phase = ThreadPhase::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Load the history of the active counterpart in one go.
    pub async fn load_history(&mut self) -> Result<(), ChatError> {
        let request = self.begin_load()?;
        let outcome = self.fetcher.fetch(&request).await;
        self.apply_history(&request, outcome)
    }

    /// Send `content` to the active counterpart.
    ///
    /// Returns `Ok(false)` without doing anything when `content` is blank.
    ///
    /// # Errors
    ///
    /// - [`ChatError::InvalidTarget`] without an active counterpart
    /// - [`ChatError::SendFailure`] when the message could not be dispatched; the
    ///   optimistic entry is removed and a notice is recorded
    pub fn send(&mut self, content: &str) -> Result<bool, ChatError> {
        let counterpart_id = self.counterpart.clone().ok_or(ChatError::InvalidTarget)?;
        let content = content.trim();
        if content.is_empty() {
            return Ok(false);
        }

        let previous = std::mem::replace(&mut self.phase, ThreadPhase::Sending);
        let optimistic = Message::optimistic(
            MessageId::temporary(self.clock.as_ref()),
            self.me.clone(),
            counterpart_id.clone(),
            content.to_string(),
            Timestamp::new(self.clock.now_millis()),
        );
        let temporary_id = optimistic.id.clone();
        self.messages.push(optimistic);
        self.draft.clear();
        self.notice = None;
        self.typing.stop();

        let dispatched = self.link.send_message(&counterpart_id, content);
        self.phase = previous;

        if !dispatched {
            tracing::warn!("Could not send message to '{}'", counterpart_id);
            self.messages.retain(|message| message.id != temporary_id);
            self.notice = Some(SEND_FAILED_NOTICE.to_string());
            return Err(ChatError::SendFailure("not connected".to_string()));
        }
        Ok(true)
    }

    /// Update the draft and signal typing to the counterpart.
    pub fn on_input(&mut self, text: &str) {
        self.draft = text.to_string();
        if let Some(counterpart_id) = &self.counterpart {
            self.typing.input(counterpart_id);
        }
    }

    /// React to an inbound event.
    pub fn handle_event(&mut self, event: &ChatEvent) {
        let Some(counterpart_id) = &self.counterpart else {
            return;
        };
        match event {
            ChatEvent::NewMessage(message) if message.is_between(&self.me, counterpart_id) => {
                self.reconcile(message.clone());
            }
            ChatEvent::Typing {
                sender_id,
                is_typing,
            } if sender_id == counterpart_id => {
                self.counterpart_typing = *is_typing;
            }
            _ => {}
        }
    }

    /// Replace the matching optimistic entry in place, or append when the id is new.
    ///
    /// When the id is already present, a matching optimistic entry is removed instead.
    fn reconcile(&mut self, message: Message) {
        if self.messages.iter().any(|existing| existing.id == message.id) {
            if let Some(index) = self
                .messages
                .iter()
                .position(|existing| existing.is_confirmed_by(&message))
            {
                tracing::debug!(
                    "Optimistic message {} already confirmed as {}",
                    self.messages[index].id,
                    message.id
                );
                self.messages.remove(index);
            }
            return;
        }

        if let Some(slot) = self
            .messages
            .iter_mut()
            .find(|existing| existing.is_confirmed_by(&message))
        {
            tracing::debug!("Optimistic message {} confirmed as {}", slot.id, message.id);
            *slot = message;
        } else {
            self.messages.push(message);
        }
    }

    /// `Incoming` when the sender is the counterpart, so every message of a
    /// self-conversation is drawn on the incoming side.
    pub fn side_of(&self, message: &Message) -> MessageSide {
        if self.counterpart.as_ref() == Some(&message.sender_id) {
            MessageSide::Incoming
        } else {
            MessageSide::Outgoing
        }
    }

    pub fn status_of(&self, message: &Message) -> DeliveryStatus {
        message.status()
    }

    pub fn connection_indicator(&self) -> ConnectionIndicator {
        self.link.state().indicator()
    }

    pub fn counterpart(&self) -> Option<&UserId> {
        self.counterpart.as_ref()
    }

    /// Messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn phase(&self) -> &ThreadPhase {
        &self.phase
    }

    pub fn counterpart_typing(&self) -> bool {
        self.counterpart_typing
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        controller::typing::tests::RecordingLink,
        domain::{MockChatApi, TEMPORARY_ID_PREFIX},
        infrastructure::credential::MemoryCredentialStore,
    };
    use async_trait::async_trait;
    use std::{
        sync::{Mutex, atomic::Ordering},
        time::Duration,
    };
    use tabiji_shared::time::FixedClock;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 楽観的送信と確定メッセージによる置き換え（重複しないこと）
    // - 送信失敗時のロールバック
    // - 履歴の再試行ポリシーと古い結果の破棄
    // - typing 状態と表示用ヘルパー
    // ========================================

    #[derive(Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn confirmed(id: &str, from: &str, to: &str, content: &str, at: i64) -> Message {
        Message {
            id: MessageId::from_server(id).unwrap(),
            sender_id: user(from),
            receiver_id: user(to),
            content: content.to_string(),
            created_at: Timestamp::new(at),
            is_read: false,
        }
    }

    fn controller_with(api: MockChatApi, link: Arc<RecordingLink>) -> ThreadController {
        ThreadController::new(
            user("me"),
            link,
            Arc::new(api),
            Arc::new(MemoryCredentialStore::with_token("tok")),
            ThreadConfig::default(),
        )
        .with_clock(Arc::new(FixedClock::new(1_700_000_000_000)))
    }

    fn ids(controller: &ThreadController) -> Vec<String> {
        controller
            .messages()
            .iter()
            .map(|m| m.id.as_str().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_optimistic_send_is_replaced_by_confirmation() {
        // テスト項目: "Hello" の送信で一時メッセージが 1 件表示され、確定 m123 で置き換わる
        // given (前提条件):
        let link = Arc::new(RecordingLink::default());
        let mut thread = controller_with(MockChatApi::new(), link.clone());
        thread.open(user("bob"));
        thread.on_input("Hello");

        // when (操作):
        let sent = thread.send("Hello").unwrap();

        // then (期待する結果): 一時メッセージが 1 件
        assert!(sent);
        assert_eq!(thread.messages().len(), 1);
        assert!(thread.messages()[0].id.as_str().starts_with(TEMPORARY_ID_PREFIX));
        assert_eq!(thread.status_of(&thread.messages()[0]), DeliveryStatus::Pending);
        assert_eq!(thread.draft(), "");
        assert_eq!(
            *link.messages.lock().unwrap(),
            vec![(user("bob"), "Hello".to_string())]
        );

        // when (操作): サーバーから確定メッセージが届く（2 回届いても重複しない）
        let echo = ChatEvent::NewMessage(confirmed("m123", "me", "bob", "Hello", 5));
        thread.handle_event(&echo);
        thread.handle_event(&echo);

        // then (期待する結果):
        assert_eq!(ids(&thread), vec!["m123"]);
        assert_eq!(thread.status_of(&thread.messages()[0]), DeliveryStatus::Sent);
    }

    #[tokio::test]
    async fn test_failed_send_leaves_no_optimistic_entry() {
        // テスト項目: 送信できなかった場合は一時メッセージが消え、通知が記録される
        // given (前提条件):
        let link = Arc::new(RecordingLink::default());
        link.offline.store(true, Ordering::SeqCst);
        let mut thread = controller_with(MockChatApi::new(), link.clone());
        thread.open(user("bob"));

        // when (操作):
        let result = thread.send("Hello");

        // then (期待する結果):
        assert!(matches!(result, Err(ChatError::SendFailure(_))));
        assert!(thread.messages().is_empty());
        assert_eq!(thread.notice(), Some(SEND_FAILED_NOTICE));
        assert_eq!(thread.phase(), &ThreadPhase::Idle);
        assert_eq!(
            thread.connection_indicator(),
            ConnectionIndicator::Reconnecting
        );
    }

    #[tokio::test]
    async fn test_blank_send_is_noop() {
        // テスト項目: 空白のみの本文は送信されない
        // given (前提条件):
        let link = Arc::new(RecordingLink::default());
        let mut thread = controller_with(MockChatApi::new(), link.clone());
        thread.open(user("bob"));

        // when (操作):
        let sent = thread.send("   \n").unwrap();

        // then (期待する結果):
        assert!(!sent);
        assert!(thread.messages().is_empty());
        assert!(link.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_without_counterpart_is_invalid_target() {
        // テスト項目: 相手が選択されていない場合は InvalidTarget になる
        // given (前提条件):
        let mut thread = controller_with(MockChatApi::new(), Arc::new(RecordingLink::default()));

        // when (操作) / then (期待する結果):
        assert_eq!(thread.send("Hello"), Err(ChatError::InvalidTarget));
        assert_eq!(thread.load_history().await, Err(ChatError::InvalidTarget));
    }

    #[tokio::test]
    async fn test_load_history_stores_oldest_first() {
        // テスト項目: 新しい順で届く履歴が古い順で保持される
        // given (前提条件):
        let mut api = MockChatApi::new();
        api.expect_fetch_history().times(1).returning(|_, _| {
            Ok(vec![
                confirmed("m3", "bob", "me", "third", 3),
                confirmed("m2", "me", "bob", "second", 2),
                confirmed("m1", "bob", "me", "first", 1),
            ])
        });
        let mut thread = controller_with(api, Arc::new(RecordingLink::default()));
        thread.open(user("bob"));

        // when (操作):
        thread.load_history().await.unwrap();

        // then (期待する結果):
        assert_eq!(ids(&thread), vec!["m1", "m2", "m3"]);
        assert_eq!(thread.phase(), &ThreadPhase::Ready);
        assert_eq!(thread.side_of(&thread.messages()[0]), MessageSide::Incoming);
        assert_eq!(thread.side_of(&thread.messages()[1]), MessageSide::Outgoing);
    }

    #[tokio::test]
    async fn test_history_retries_with_linear_backoff() {
        // テスト項目: 履歴取得の失敗は 2s, 4s 待って再試行され、3 回目で成功する
        // given (前提条件):
        let mut api = MockChatApi::new();
        let mut seq = mockall::Sequence::new();
        api.expect_fetch_history()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(ApiError::Status(502)));
        api.expect_fetch_history()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec![confirmed("m1", "bob", "me", "hi", 1)]));
        let sleeper = Arc::new(RecordingSleeper::default());
        let mut thread = controller_with(api, Arc::new(RecordingLink::default()))
            .with_sleeper(sleeper.clone());
        thread.open(user("bob"));

        // when (操作):
        let result = thread.load_history().await;

        // then (期待する結果):
        assert_eq!(result, Ok(()));
        assert_eq!(
            *sleeper.delays.lock().unwrap(),
            vec![Duration::from_millis(2000), Duration::from_millis(4000)]
        );
        assert_eq!(ids(&thread), vec!["m1"]);
    }

    #[tokio::test]
    async fn test_history_gives_up_after_three_retries() {
        // テスト項目: 初回 + 3 回の再試行がすべて失敗すると Failed になる
        // given (前提条件):
        let mut api = MockChatApi::new();
        api.expect_fetch_history()
            .times(4)
            .returning(|_, _| Err(ApiError::Request("connection reset".to_string())));
        let sleeper = Arc::new(RecordingSleeper::default());
        let mut thread = controller_with(api, Arc::new(RecordingLink::default()))
            .with_sleeper(sleeper.clone());
        thread.open(user("bob"));

        // when (操作):
        let result = thread.load_history().await;

        // then (期待する結果):
        assert!(matches!(result, Err(ChatError::FetchFailure(_))));
        assert!(matches!(thread.phase(), ThreadPhase::Failed(_)));
        assert_eq!(
            *sleeper.delays.lock().unwrap(),
            vec![
                Duration::from_millis(2000),
                Duration::from_millis(4000),
                Duration::from_millis(6000)
            ]
        );
    }

    #[tokio::test]
    async fn test_unauthorized_history_is_not_retried() {
        // テスト項目: 401 は再試行せず Unauthenticated を返す
        // given (前提条件):
        let mut api = MockChatApi::new();
        api.expect_fetch_history()
            .times(1)
            .returning(|_, _| Err(ApiError::Unauthorized));
        let mut thread = controller_with(api, Arc::new(RecordingLink::default()));
        thread.open(user("bob"));

        // when (操作):
        let result = thread.load_history().await;

        // then (期待する結果):
        assert_eq!(result, Err(ChatError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_stale_history_is_dropped_after_switching_counterpart() {
        // テスト項目: 相手を切り替えた後に届いた古い履歴は破棄される
        // given (前提条件):
        let mut api = MockChatApi::new();
        api.expect_fetch_history()
            .returning(|_, _| Ok(vec![confirmed("m1", "bob", "me", "for bob", 1)]));
        let mut thread = controller_with(api, Arc::new(RecordingLink::default()));
        thread.open(user("bob"));
        let request = thread.begin_load().unwrap();
        let outcome = thread.fetcher().fetch(&request).await;

        // when (操作): 結果を適用する前に carol のスレッドへ切り替える
        thread.open(user("carol"));
        let applied = thread.apply_history(&request, outcome);

        // then (期待する結果):
        assert_eq!(applied, Ok(()));
        assert!(thread.messages().is_empty());
        assert_eq!(thread.phase(), &ThreadPhase::Idle);
        assert_eq!(thread.counterpart(), Some(&user("carol")));
    }

    #[tokio::test]
    async fn test_messages_arriving_during_load_are_kept() {
        // テスト項目: 読み込み中に届いたメッセージは履歴適用後も重複なく残る
        // given (前提条件):
        let mut thread =
            controller_with(MockChatApi::new(), Arc::new(RecordingLink::default()));
        thread.open(user("bob"));
        let request = thread.begin_load().unwrap();
        thread.handle_event(&ChatEvent::NewMessage(confirmed("m2", "bob", "me", "b", 2)));
        thread.handle_event(&ChatEvent::NewMessage(confirmed("m3", "bob", "me", "c", 3)));

        // when (操作): 履歴には m2 も含まれている
        thread
            .apply_history(
                &request,
                Ok(vec![
                    confirmed("m1", "me", "bob", "a", 1),
                    confirmed("m2", "bob", "me", "b", 2),
                ]),
            )
            .unwrap();

        // then (期待する結果):
        assert_eq!(ids(&thread), vec!["m1", "m2", "m3"]);
    }

    #[tokio::test]
    async fn test_messages_of_other_threads_are_ignored() {
        // テスト項目: 別の相手とのメッセージはスレッドに追加されない
        // given (前提条件):
        let mut thread =
            controller_with(MockChatApi::new(), Arc::new(RecordingLink::default()));
        thread.open(user("bob"));

        // when (操作):
        thread.handle_event(&ChatEvent::NewMessage(confirmed("m1", "carol", "me", "x", 1)));

        // then (期待する結果):
        assert!(thread.messages().is_empty());
    }

    #[tokio::test]
    async fn test_counterpart_typing_follows_inbound_events() {
        // テスト項目: 相手からの typing イベントのみが入力中表示に反映される
        // given (前提条件):
        let mut thread =
            controller_with(MockChatApi::new(), Arc::new(RecordingLink::default()));
        thread.open(user("bob"));

        // when (操作) / then (期待する結果):
        thread.handle_event(&ChatEvent::Typing {
            sender_id: user("carol"),
            is_typing: true,
        });
        assert!(!thread.counterpart_typing());
        thread.handle_event(&ChatEvent::Typing {
            sender_id: user("bob"),
            is_typing: true,
        });
        assert!(thread.counterpart_typing());
        thread.handle_event(&ChatEvent::Typing {
            sender_id: user("bob"),
            is_typing: false,
        });
        assert!(!thread.counterpart_typing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_ends_typing_burst_once() {
        // テスト項目: 入力後に送信すると typing=false が 1 回だけ送られる
        // given (前提条件):
        let link = Arc::new(RecordingLink::default());
        let mut thread = controller_with(MockChatApi::new(), link.clone());
        thread.open(user("bob"));
        thread.on_input("H");
        thread.on_input("He");

        // when (操作):
        thread.send("He").unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;

        // then (期待する結果):
        assert_eq!(link.typing_flags(), vec![true, true, false]);
    }

    #[tokio::test]
    async fn test_self_conversation_side_follows_counterpart() {
        // テスト項目: 自分宛ての会話では送信者 == 相手なので受信側として表示される
        // given (前提条件):
        let link = Arc::new(RecordingLink::default());
        let mut thread = controller_with(MockChatApi::new(), link);
        thread.open(user("me"));
        thread.send("note to self").unwrap();

        // when (操作):
        thread.handle_event(&ChatEvent::NewMessage(confirmed(
            "m1",
            "me",
            "me",
            "note to self",
            1,
        )));

        // then (期待する結果):
        assert_eq!(ids(&thread), vec!["m1"]);
        assert_eq!(thread.side_of(&thread.messages()[0]), MessageSide::Incoming);
    }

    #[tokio::test]
    async fn test_side_is_decided_by_counterpart() {
        // テスト項目: 相手からのメッセージは受信側、それ以外は送信側になる
        // given (前提条件):
        let link = Arc::new(RecordingLink::default());
        let mut thread = controller_with(MockChatApi::new(), link);
        thread.open(user("bob"));

        // when (操作) / then (期待する結果):
        assert_eq!(
            thread.side_of(&confirmed("m1", "bob", "me", "hi", 1)),
            MessageSide::Incoming
        );
        assert_eq!(
            thread.side_of(&confirmed("m2", "me", "bob", "hey", 2)),
            MessageSide::Outgoing
        );
    }

    #[tokio::test]
    async fn test_send_during_load_then_late_echo_keeps_one_message() {
        // テスト項目: 履歴読み込み中に送信し、履歴と遅れて届いたエコーの両方に確定版があっても 1 件だけ残る
        // given (前提条件):
        let link = Arc::new(RecordingLink::default());
        let mut thread = controller_with(MockChatApi::new(), link);
        thread.open(user("bob"));
        let request = thread.begin_load().unwrap();
        thread.send("Hello").unwrap();

        // when (操作): 確定版 m123 を含む履歴が適用される
        thread
            .apply_history(&request, Ok(vec![confirmed("m123", "me", "bob", "Hello", 5)]))
            .unwrap();

        // then (期待する結果):
        assert_eq!(ids(&thread), vec!["m123"]);

        // when (操作): 同じ m123 がソケットから遅れて届く
        thread.handle_event(&ChatEvent::NewMessage(confirmed(
            "m123", "me", "bob", "Hello", 5,
        )));

        // then (期待する結果):
        assert_eq!(ids(&thread), vec!["m123"]);
        assert_eq!(thread.phase(), &ThreadPhase::Ready);
    }

    #[tokio::test]
    async fn test_late_echo_removes_pending_copy_of_known_message() {
        // テスト項目: 既に表示済みの確定メッセージが再度届いた場合、一致する一時メッセージは取り除かれる
        // given (前提条件): 確定 m123 と、同じ本文の一時メッセージが並んでいる
        let link = Arc::new(RecordingLink::default());
        let mut thread = controller_with(MockChatApi::new(), link);
        thread.open(user("bob"));
        thread.handle_event(&ChatEvent::NewMessage(confirmed(
            "m123", "me", "bob", "Hello", 5,
        )));
        thread.send("Hello").unwrap();
        assert_eq!(thread.messages().len(), 2);

        // when (操作):
        thread.handle_event(&ChatEvent::NewMessage(confirmed(
            "m123", "me", "bob", "Hello", 5,
        )));

        // then (期待する結果):
        assert_eq!(ids(&thread), vec!["m123"]);
    }
}
