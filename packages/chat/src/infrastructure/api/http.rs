//! `ChatApi` implementation over HTTP (reqwest).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tabiji_shared::protocol::{
    CONVERSATIONS_PATH, ConversationListResponse, HistoryResponse, MESSAGES_PATH_PREFIX,
};

use crate::domain::{ApiError, ChatApi, ConversationSummary, Message, UserId};

/// REST client for the chat backend.
#[derive(Debug, Clone)]
pub struct HttpChatApi {
    client: Client,
    base_url: String,
}

impl HttpChatApi {
    /// # Arguments
    ///
    /// * `base_url` - API origin, e.g. `http://127.0.0.1:8080`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn history_url(&self, counterpart_id: &UserId) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            MESSAGES_PATH_PREFIX,
            counterpart_id.as_str()
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, token: &str) -> Result<T, ApiError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(ApiError::Unauthorized),
            status if !status.is_success() => return Err(ApiError::Status(status.as_u16())),
            _ => {}
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn fetch_conversations(
        &self,
        token: &str,
    ) -> Result<Vec<ConversationSummary>, ApiError> {
        let url = format!("{}{}", self.base_url, CONVERSATIONS_PATH);
        let body: ConversationListResponse = self.get_json(&url, token).await?;
        if !body.success {
            return Err(ApiError::Rejected(body.message.unwrap_or_default()));
        }

        body.conversations
            .into_iter()
            .map(|record| {
                ConversationSummary::try_from(record).map_err(|e| ApiError::Decode(e.to_string()))
            })
            .collect()
    }

    async fn fetch_history(
        &self,
        token: &str,
        counterpart_id: &UserId,
    ) -> Result<Vec<Message>, ApiError> {
        let url = self.history_url(counterpart_id);
        let body: HistoryResponse = self.get_json(&url, token).await?;
        if !body.success {
            return Err(ApiError::Rejected(body.message.unwrap_or_default()));
        }
        tracing::debug!(
            "Fetched {} messages with '{}'",
            body.messages.len(),
            counterpart_id
        );

        body.messages
            .into_iter()
            .map(|record| Message::try_from(record).map_err(|e| ApiError::Decode(e.to_string())))
            .collect()
    }
}
