//! Domain layer of the chat client core: entities, value objects, events and
//! the ports the infrastructure layer implements.

pub mod api;
pub mod broadcast;
pub mod conversation;
pub mod credential;
pub mod error;
pub mod event;
pub mod message;
pub mod presence;
pub mod transport;
pub mod value_object;

pub use api::ChatApi;
#[cfg(test)]
pub use api::MockChatApi;
pub use broadcast::{CHAT_EVENTS_CHANNEL, CrossTabBus, CrossTabChannel, TabEnvelope};
pub use conversation::{
    ConversationSummary, LastMessage, SELF_CONVERSATION_LABEL, sort_by_presence,
};
pub use credential::{AUTH_TOKEN_KEY, CredentialStore};
pub use error::{
    ApiError, BroadcastError, ChatError, CredentialError, NormalizeError, TransportError,
    ValueObjectError,
};
pub use event::{ChatEvent, OutboundEvent};
pub use message::{DeliveryStatus, Message};
pub use presence::{Presence, PresenceTracker, PresenceUpdate};
pub use transport::{Connector, OutboundFrame, TransportEvent, TransportHandle};
pub use value_object::{MessageId, TEMPORARY_ID_PREFIX, TabId, Timestamp, UserId};
