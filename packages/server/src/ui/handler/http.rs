//! HTTP API endpoint handlers.
//!
//! Every chat endpoint requires `Authorization: Bearer <token>`.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
};
use tabiji_shared::protocol::{ConversationListResponse, HistoryResponse, MessageRecord};

use crate::{
    domain::User,
    infrastructure::dto::conversation_record,
    ui::state::AppState,
    usecase::HistoryError,
};

/// `Authorization` ヘッダーから bearer token を取り出す
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

async fn authorize(state: &AppState, headers: &HeaderMap) -> Result<User, StatusCode> {
    let token = bearer_token(headers).ok_or(StatusCode::UNAUTHORIZED)?;
    state
        .authenticate_usecase
        .execute(token)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get the caller's conversation list
pub async fn get_conversations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ConversationListResponse>, StatusCode> {
    let me = authorize(&state, &headers).await?;
    let conversations = state.get_conversations_usecase.execute(&me.id).await;

    // Domain Model から DTO への変換
    Ok(Json(ConversationListResponse {
        success: true,
        conversations: conversations
            .iter()
            .map(|view| conversation_record(&me.id, view))
            .collect(),
        message: None,
    }))
}

/// Get the history between the caller and `counterpart_id` (newest first)
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(counterpart_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<HistoryResponse>, (StatusCode, Json<HistoryResponse>)> {
    let me = authorize(&state, &headers).await.map_err(|status| {
        (
            status,
            Json(HistoryResponse {
                success: false,
                messages: Vec::new(),
                message: Some("unauthorized".to_string()),
            }),
        )
    })?;

    match state
        .get_history_usecase
        .execute(&me.id, &counterpart_id)
        .await
    {
        Ok(history) => Ok(Json(HistoryResponse {
            success: true,
            messages: history.iter().map(MessageRecord::from).collect(),
            message: None,
        })),
        Err(e @ HistoryError::CounterpartNotFound(_)) => {
            tracing::warn!("History request from '{}' failed: {}", me.id, e);
            Err((
                StatusCode::NOT_FOUND,
                Json(HistoryResponse {
                    success: false,
                    messages: Vec::new(),
                    message: Some(e.to_string()),
                }),
            ))
        }
    }
}
