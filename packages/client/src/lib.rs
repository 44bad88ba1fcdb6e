//! Terminal chat front-end for Tabiji.
//!
//! Wires one `tabiji_chat::ChatTab` to a line-based prompt: inbound events are
//! printed as they arrive and every line typed is either a command or a
//! message to the open thread.

pub mod app;
pub mod command;
pub mod error;
pub mod formatter;
pub mod ui;

pub use app::run_client;
pub use error::ClientError;
