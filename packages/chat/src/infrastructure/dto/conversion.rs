//! Conversion logic between wire DTOs and domain entities.

use tabiji_shared::{protocol as dto, time::rfc3339_to_timestamp};

use crate::domain::{
    ChatEvent, ConversationSummary, LastMessage, Message, MessageId, NormalizeError,
    OutboundEvent, PresenceUpdate, Timestamp, UserId,
};

// ========================================
// DTO → Domain Entity
// ========================================

impl TryFrom<dto::WireTimestamp> for Timestamp {
    type Error = NormalizeError;

    fn try_from(value: dto::WireTimestamp) -> Result<Self, Self::Error> {
        match value {
            dto::WireTimestamp::Millis(millis) => Ok(Timestamp::new(millis)),
            dto::WireTimestamp::Text(text) => rfc3339_to_timestamp(&text)
                .map(Timestamp::new)
                .ok_or(NormalizeError::InvalidTimestamp(text)),
        }
    }
}

impl TryFrom<dto::MessageRecord> for Message {
    type Error = NormalizeError;

    fn try_from(record: dto::MessageRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: MessageId::from_server(record.id)?,
            sender_id: UserId::new(record.sender_id)?,
            receiver_id: UserId::new(record.receiver_id)?,
            content: record.content,
            created_at: record.created_at.try_into()?,
            is_read: record.is_read,
        })
    }
}

impl TryFrom<dto::PresenceRecord> for PresenceUpdate {
    type Error = NormalizeError;

    fn try_from(record: dto::PresenceRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: UserId::new(record.user_id)?,
            is_online: record.is_online,
            last_seen: record.last_seen.map(Timestamp::try_from).transpose()?,
        })
    }
}

impl TryFrom<dto::ConversationRecord> for ConversationSummary {
    type Error = NormalizeError;

    fn try_from(record: dto::ConversationRecord) -> Result<Self, Self::Error> {
        let last_message = record
            .last_message
            .map(|last| -> Result<LastMessage, NormalizeError> {
                Ok(LastMessage {
                    content: last.content,
                    created_at: last.created_at.try_into()?,
                    from_me: last.from_me,
                })
            })
            .transpose()?;

        Ok(Self {
            counterpart_id: UserId::new(record.counterpart.id)?,
            display_name: record.counterpart.name,
            avatar: record.counterpart.avatar,
            last_message,
            unread_count: record.unread_count,
            is_self: record.is_self,
        })
    }
}

impl TryFrom<dto::ServerEvent> for ChatEvent {
    type Error = NormalizeError;

    fn try_from(event: dto::ServerEvent) -> Result<Self, Self::Error> {
        Ok(match event {
            dto::ServerEvent::NewMessage(record) => ChatEvent::NewMessage(record.try_into()?),
            dto::ServerEvent::Typing(notice) => ChatEvent::Typing {
                sender_id: UserId::new(notice.sender_id)?,
                is_typing: notice.is_typing,
            },
            dto::ServerEvent::Presence(snapshot) => ChatEvent::Presence(
                snapshot
                    .users
                    .into_iter()
                    .map(PresenceUpdate::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            dto::ServerEvent::PresenceUpdate(record) => {
                ChatEvent::PresenceUpdate(record.try_into()?)
            }
        })
    }
}

/// Parse and normalize one text frame received from the server.
pub fn decode_server_frame(text: &str) -> Result<ChatEvent, NormalizeError> {
    let event: dto::ServerEvent = serde_json::from_str(text)
        .map_err(|e| NormalizeError::MalformedFrame(e.to_string()))?;
    event.try_into()
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<OutboundEvent> for dto::ClientEvent {
    fn from(event: OutboundEvent) -> Self {
        match event {
            OutboundEvent::SendMessage {
                receiver_id,
                content,
            } => dto::ClientEvent::SendMessage(dto::SendMessagePayload {
                receiver_id: receiver_id.into_string(),
                content,
            }),
            OutboundEvent::Typing {
                receiver_id,
                is_typing,
            } => dto::ClientEvent::Typing(dto::TypingPayload {
                receiver_id: receiver_id.into_string(),
                is_typing,
            }),
        }
    }
}

/// Serialize an outbound event into a text frame.
pub fn encode_client_frame(event: OutboundEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(&dto::ClientEvent::from(event))
}
