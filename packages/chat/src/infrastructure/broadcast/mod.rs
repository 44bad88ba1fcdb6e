//! Cross-tab bus implementations.

pub mod local;

pub use local::{LocalBroadcastBus, TabSubscription};
