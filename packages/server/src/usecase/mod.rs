//! UseCase 層
//!
//! Domain 層の trait にのみ依存し、WebSocket / HTTP ハンドラーから呼び出される。

pub mod authenticate;
pub mod connect_participant;
pub mod disconnect_participant;
pub mod error;
pub mod get_conversations;
pub mod get_history;
pub mod relay_typing;
pub mod send_message;

pub use authenticate::AuthenticateUseCase;
pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{AuthError, HistoryError, SendMessageError};
pub use get_conversations::GetConversationsUseCase;
pub use get_history::GetHistoryUseCase;
pub use relay_typing::RelayTypingUseCase;
pub use send_message::SendMessageUseCase;
