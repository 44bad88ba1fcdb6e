//! Transport connector implementations.
//!
//! - `websocket`: WebSocket（tokio-tungstenite）を使った実装

pub mod websocket;

pub use websocket::WebSocketConnector;
