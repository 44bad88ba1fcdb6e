//! Typed connection state.

/// Why a connection ended for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// `disconnect()` was called.
    Manual,
    /// Automatic reconnection gave up.
    RetriesExhausted,
    /// The credential disappeared between attempts.
    Unauthenticated,
}

/// State of a tab's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    /// Waiting for or performing automatic attempt `attempt` (1-based).
    Reconnecting { attempt: u32 },
    Disconnected(DisconnectReason),
}

/// What a presentation layer shows for the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionIndicator {
    Live,
    /// Distinct from a counterpart being offline.
    Reconnecting,
    Offline,
    /// Automatic recovery stopped; the user must retry.
    NeedsManualRetry,
}

impl ConnectionState {
    /// Whether a driver owns the connection (connecting, connected or backing off).
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting
                | ConnectionState::Connected
                | ConnectionState::Reconnecting { .. }
        )
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn indicator(&self) -> ConnectionIndicator {
        match self {
            ConnectionState::Connected => ConnectionIndicator::Live,
            ConnectionState::Connecting | ConnectionState::Reconnecting { .. } => {
                ConnectionIndicator::Reconnecting
            }
            ConnectionState::Disconnected(
                DisconnectReason::RetriesExhausted | DisconnectReason::Unauthenticated,
            ) => ConnectionIndicator::NeedsManualRetry,
            ConnectionState::Idle | ConnectionState::Disconnected(DisconnectReason::Manual) => {
                ConnectionIndicator::Offline
            }
        }
    }
}
