//! Connection layer: one authenticated real-time connection per tab.

pub mod backoff;
pub mod manager;
pub mod state;

pub use backoff::{ReconnectPolicy, Sleeper, TokioSleeper};
pub use manager::{
    ChatLink, ConnectionLease, ConnectionManager, ConnectionManagerBuilder, EventCallback,
};
pub use state::{ConnectionIndicator, ConnectionState, DisconnectReason};
