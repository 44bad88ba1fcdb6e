//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tabiji_shared::protocol::ClientEvent;
use tokio::sync::mpsc;

use crate::{
    domain::{PresenceView, SocketId, User, UserId},
    infrastructure::dto::{
        encode, new_message_event, presence_snapshot_event, presence_update_event, typing_event,
    },
    ui::state::AppState,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let Some(token) = query.token else {
        tracing::warn!("WebSocket connection without token rejected");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let user = match state.authenticate_usecase.execute(&token).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("WebSocket connection rejected: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    tracing::info!("User '{}' authenticated, upgrading", user.id);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user)))
}

/// Spawns a task that receives frames from the rx channel and pushes them to the WebSocket sender.
///
/// # Arguments
///
/// * `rx` - Channel receiver for frames addressed to this socket
/// * `sender` - WebSocket sink of this socket
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user: User) {
    let (sender, mut receiver) = socket.split();
    let socket_id = SocketId::generate();
    let (tx, rx) = mpsc::unbounded_channel();

    // Register first so the snapshot already reports this user online
    let first_socket = state
        .connect_participant_usecase
        .execute(user.id.clone(), socket_id.clone(), tx.clone())
        .await;
    tracing::info!(
        "User '{}' connected (socket {})",
        user.id,
        socket_id.as_str()
    );

    let snapshot = state.connect_participant_usecase.presence_snapshot().await;
    match encode(&presence_snapshot_event(&snapshot)) {
        Ok(json) => {
            let _ = tx.send(json);
        }
        Err(e) => tracing::error!("Failed to encode presence snapshot: {}", e),
    }
    drop(tx);

    if first_socket {
        let online = PresenceView {
            user_id: user.id.clone(),
            is_online: true,
            last_seen: None,
        };
        match encode(&presence_update_event(&online)) {
            Ok(json) => {
                state
                    .connect_participant_usecase
                    .broadcast_online(&user.id, &json)
                    .await;
                tracing::info!("Broadcasted online presence for '{}'", user.id);
            }
            Err(e) => tracing::error!("Failed to encode presence update: {}", e),
        }
    }

    let state_clone = state.clone();
    let sender_id = user.id.clone();

    // Spawn a task to receive events from this socket
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => handle_client_event(&state_clone, &sender_id, event).await,
                    Err(e) => {
                        tracing::warn!("Ignoring malformed frame from '{}': {}", sender_id, e)
                    }
                },
                Message::Close(_) => {
                    tracing::info!("User '{}' requested close", sender_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to push frames addressed to this socket
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    let Some(offline) = state
        .disconnect_participant_usecase
        .execute(&user.id, &socket_id)
        .await
    else {
        tracing::info!(
            "Socket {} of '{}' closed, other sockets remain",
            socket_id.as_str(),
            user.id
        );
        return;
    };

    tracing::info!("User '{}' went offline", user.id);
    match encode(&presence_update_event(&offline)) {
        Ok(json) => {
            state
                .disconnect_participant_usecase
                .broadcast_offline(&user.id, &json)
                .await
        }
        Err(e) => tracing::error!("Failed to encode presence update: {}", e),
    }
}

async fn handle_client_event(state: &AppState, sender_id: &UserId, event: ClientEvent) {
    match event {
        ClientEvent::SendMessage(payload) => {
            let message = match state
                .send_message_usecase
                .execute(sender_id.clone(), &payload.receiver_id, payload.content)
                .await
            {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!("Message from '{}' rejected: {}", sender_id, e);
                    return;
                }
            };
            match encode(&new_message_event(&message)) {
                Ok(json) => state.send_message_usecase.deliver(&message, &json).await,
                Err(e) => tracing::error!("Failed to encode message: {}", e),
            }
        }
        ClientEvent::Typing(payload) => {
            let Ok(receiver_id) = UserId::new(payload.receiver_id) else {
                tracing::warn!("Typing notice from '{}' without receiver", sender_id);
                return;
            };
            match encode(&typing_event(sender_id, payload.is_typing)) {
                Ok(json) => {
                    state
                        .relay_typing_usecase
                        .execute(&receiver_id, &json)
                        .await;
                }
                Err(e) => tracing::error!("Failed to encode typing notice: {}", e),
            }
        }
    }
}
