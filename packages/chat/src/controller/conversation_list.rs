//! Conversation list controller.
//!
//! Holds the last loaded list of conversation summaries and the presence map.
//! A "new message" event (local or mirrored from another tab) triggers a full
//! refetch; presence events only update the presence map, and the online-first
//! order is recomputed on every read.

use std::sync::Arc;

use crate::domain::{
    ApiError, ChatApi, ChatError, ChatEvent, ConversationSummary, CredentialStore,
    PresenceTracker, sort_by_presence,
};

/// Load status of the list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ListStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    /// The last load failed; the previous list (if any) is still shown.
    Failed(String),
}

pub struct ConversationListController {
    api: Arc<dyn ChatApi>,
    credentials: Arc<dyn CredentialStore>,
    conversations: Vec<ConversationSummary>,
    presence: PresenceTracker,
    status: ListStatus,
}

impl ConversationListController {
    pub fn new(api: Arc<dyn ChatApi>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            api,
            credentials,
            conversations: Vec::new(),
            presence: PresenceTracker::new(),
            status: ListStatus::Idle,
        }
    }

    /// Fetch all conversation summaries.
    ///
    /// # Errors
    ///
    /// - [`ChatError::Unauthenticated`] without a credential or when the backend rejects it
    /// - [`ChatError::FetchFailure`] otherwise; the previous list is kept
    pub async fn load(&mut self) -> Result<(), ChatError> {
        let token = self
            .credentials
            .auth_token()
            .ok_or(ChatError::Unauthenticated)?;

        self.status = ListStatus::Loading;
        match self.api.fetch_conversations(&token).await {
            Ok(conversations) => {
                tracing::debug!("Loaded {} conversations", conversations.len());
                self.conversations = conversations;
                self.status = ListStatus::Ready;
                Ok(())
            }
            Err(ApiError::Unauthorized) => {
                tracing::warn!("Conversation list rejected the credential");
                self.status = ListStatus::Failed(ChatError::Unauthenticated.to_string());
                Err(ChatError::Unauthenticated)
            }
            Err(e) => {
                tracing::error!("Failed to load conversations: {}", e);
                self.status = ListStatus::Failed(e.to_string());
                Err(ChatError::FetchFailure(e.to_string()))
            }
        }
    }

    /// React to an inbound event.
    pub async fn handle_event(&mut self, event: &ChatEvent) -> Result<(), ChatError> {
        match event {
            ChatEvent::NewMessage(_) => self.load().await,
            ChatEvent::Presence(updates) => {
                for update in updates {
                    self.presence.apply(update);
                }
                Ok(())
            }
            ChatEvent::PresenceUpdate(update) => {
                self.presence.apply(update);
                Ok(())
            }
            ChatEvent::Typing { .. } => Ok(()),
        }
    }

    /// Conversations, online counterparts first.
    pub fn conversations(&self) -> Vec<&ConversationSummary> {
        sort_by_presence(&self.conversations, &self.presence)
    }

    /// Conversations whose title contains `query` (case-insensitive), online first.
    pub fn search(&self, query: &str) -> Vec<&ConversationSummary> {
        let mut matching = self.conversations();
        matching.retain(|conversation| conversation.matches(query));
        matching
    }

    pub fn total_unread(&self) -> u32 {
        self.conversations
            .iter()
            .map(|conversation| conversation.unread_count)
            .sum()
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    pub fn status(&self) -> &ListStatus {
        &self.status
    }
}
