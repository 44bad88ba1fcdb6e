//! Domain 層（サーバー側）

pub mod error;
pub mod model;
pub mod pusher;
pub mod repository;

pub use error::{MessagePushError, RepositoryError, ValueObjectError};
pub use model::{
    ChatMessage, ConversationView, MAX_CONTENT_CHARS, MessageContent, MessageId, PresenceView,
    SocketId, Timestamp, User, UserId,
};
#[cfg(test)]
pub use pusher::MockMessagePusher;
pub use pusher::{MessagePusher, PusherChannel};
pub use repository::ChatRepository;
