//! Message entity.

use super::value_object::{MessageId, Timestamp, UserId};

/// A chat message in its canonical in-memory shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub created_at: Timestamp,
    pub is_read: bool,
}

/// Delivery status shown next to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Optimistic, not yet confirmed by the server.
    Pending,
    Sent,
    Read,
}

impl Message {
    /// Build an optimistic message holding a temporary id.
    pub fn optimistic(
        id: MessageId,
        sender_id: UserId,
        receiver_id: UserId,
        content: String,
        created_at: Timestamp,
    ) -> Self {
        debug_assert!(id.is_temporary());
        Self {
            id,
            sender_id,
            receiver_id,
            content,
            created_at,
            is_read: false,
        }
    }

    pub fn is_optimistic(&self) -> bool {
        self.id.is_temporary()
    }

    pub fn status(&self) -> DeliveryStatus {
        if self.is_optimistic() {
            DeliveryStatus::Pending
        } else if self.is_read {
            DeliveryStatus::Read
        } else {
            DeliveryStatus::Sent
        }
    }

    /// Whether this message belongs to the two-party thread between `me` and `counterpart`.
    ///
    /// For a self-conversation both ids are equal and only messages to oneself match.
    pub fn is_between(&self, me: &UserId, counterpart: &UserId) -> bool {
        (self.sender_id == *me && self.receiver_id == *counterpart)
            || (self.sender_id == *counterpart && self.receiver_id == *me)
    }

    /// Whether `other` is the confirmed echo of this optimistic message.
    ///
    /// Matching is by sender and content only: two identical messages sent in
    /// quick succession may pair with the wrong echo.
    pub fn is_confirmed_by(&self, other: &Message) -> bool {
        self.is_optimistic()
            && !other.is_optimistic()
            && self.sender_id == other.sender_id
            && self.content == other.content
    }
}
