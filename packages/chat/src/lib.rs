//! Real-time chat client core.
//!
//! One [`connection::ConnectionManager`] per tab owns the transport connection
//! and fans inbound events out to a single subscriber and to sibling tabs. The
//! [`controller`] module holds the conversation list and thread state machines
//! that a presentation layer drives; [`ChatTab`] wires them together.

// layers
pub mod connection;
pub mod controller;
pub mod domain;
pub mod infrastructure;

pub mod config;
pub mod tab;

pub use config::{ChatConfig, ThreadConfig};
pub use domain::ChatError;
pub use tab::{ChatTab, EventOrigin};
