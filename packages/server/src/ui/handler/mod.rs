//! HTTP / WebSocket handlers.

mod http;
mod websocket;

pub use http::{get_conversations, get_history, health_check};
pub use websocket::websocket_handler;
