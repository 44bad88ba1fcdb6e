//! Server state shared by the handlers.

use std::sync::Arc;

use crate::{
    domain::{ChatRepository, MessagePusher},
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryChatRepository, SeedUser},
    },
    usecase::{
        AuthenticateUseCase, ConnectParticipantUseCase, DisconnectParticipantUseCase,
        GetConversationsUseCase, GetHistoryUseCase, RelayTypingUseCase, SendMessageUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// AuthenticateUseCase（bearer token 認証のユースケース）
    pub authenticate_usecase: Arc<AuthenticateUseCase>,
    /// ConnectParticipantUseCase（ソケット接続のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（ソケット切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// RelayTypingUseCase（入力中通知のユースケース）
    pub relay_typing_usecase: Arc<RelayTypingUseCase>,
    /// GetConversationsUseCase（会話一覧取得のユースケース）
    pub get_conversations_usecase: Arc<GetConversationsUseCase>,
    /// GetHistoryUseCase（履歴取得のユースケース）
    pub get_history_usecase: Arc<GetHistoryUseCase>,
}

impl AppState {
    /// Repository と MessagePusher から全ユースケースを組み立てる
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            authenticate_usecase: Arc::new(AuthenticateUseCase::new(repository.clone())),
            connect_participant_usecase: Arc::new(ConnectParticipantUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            )),
            disconnect_participant_usecase: Arc::new(DisconnectParticipantUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            )),
            send_message_usecase: Arc::new(SendMessageUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            )),
            relay_typing_usecase: Arc::new(RelayTypingUseCase::new(message_pusher)),
            get_conversations_usecase: Arc::new(GetConversationsUseCase::new(repository.clone())),
            get_history_usecase: Arc::new(GetHistoryUseCase::new(repository)),
        }
    }

    /// インメモリの Repository と WebSocket の MessagePusher で組み立てる
    pub fn in_memory(seeds: impl IntoIterator<Item = SeedUser>) -> Self {
        Self::new(
            Arc::new(InMemoryChatRepository::new(seeds)),
            Arc::new(WebSocketMessagePusher::new()),
        )
    }
}
