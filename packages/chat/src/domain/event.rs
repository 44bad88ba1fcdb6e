//! Inbound and outbound chat events.

use super::{message::Message, presence::PresenceUpdate, value_object::UserId};

/// An inbound event delivered by the transport (or mirrored from a sibling tab).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A message was sent to or by the signed-in user.
    NewMessage(Message),
    /// A counterpart started or stopped typing.
    Typing { sender_id: UserId, is_typing: bool },
    /// Presence snapshot sent right after connecting.
    Presence(Vec<PresenceUpdate>),
    /// Presence change of a single user.
    PresenceUpdate(PresenceUpdate),
}

impl ChatEvent {
    /// Event name as used on the wire, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ChatEvent::NewMessage(_) => "new_message",
            ChatEvent::Typing { .. } => "typing",
            ChatEvent::Presence(_) => "presence",
            ChatEvent::PresenceUpdate(_) => "presence_update",
        }
    }
}

/// An event the client emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    SendMessage { receiver_id: UserId, content: String },
    Typing { receiver_id: UserId, is_typing: bool },
}
