//! Development chat backend for Tabiji.
//!
//! Serves the WebSocket transport (`/socket?token=...`) and the REST endpoints
//! used by `tabiji-chat`. Everything is kept in memory.

pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
