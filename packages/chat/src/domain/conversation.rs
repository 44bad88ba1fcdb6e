//! Conversation summaries and the pure projections over them.

use super::{
    presence::PresenceTracker,
    value_object::{Timestamp, UserId},
};

/// Label self-conversations are searched and shown under.
pub const SELF_CONVERSATION_LABEL: &str = "My Notes";

/// Last message of a conversation, as shown in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastMessage {
    pub content: String,
    pub created_at: Timestamp,
    pub from_me: bool,
}

/// One entry of the conversation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub counterpart_id: UserId,
    pub display_name: String,
    pub avatar: Option<String>,
    pub last_message: Option<LastMessage>,
    pub unread_count: u32,
    pub is_self: bool,
}

impl ConversationSummary {
    /// Name shown for the conversation.
    pub fn title(&self) -> &str {
        if self.is_self {
            SELF_CONVERSATION_LABEL
        } else {
            &self.display_name
        }
    }

    /// Case-insensitive substring match against the title.
    pub fn matches(&self, query: &str) -> bool {
        self.title()
            .to_lowercase()
            .contains(&query.trim().to_lowercase())
    }
}

/// Order conversations online-first. The sort is stable, so the server order
/// is kept within each group.
pub fn sort_by_presence<'a>(
    conversations: &'a [ConversationSummary],
    presence: &PresenceTracker,
) -> Vec<&'a ConversationSummary> {
    let mut sorted: Vec<&ConversationSummary> = conversations.iter().collect();
    sorted.sort_by_key(|conversation| !presence.is_online(&conversation.counterpart_id));
    sorted
}
