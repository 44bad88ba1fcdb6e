//! Error types for the chat client core.

use thiserror::Error;

/// Errors surfaced by the connection manager and the controllers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// No credential is present; the caller must send the user to sign-in.
    #[error("not authenticated")]
    Unauthenticated,

    /// A thread operation was called without a counterpart.
    #[error("no conversation counterpart selected")]
    InvalidTarget,

    /// The real-time transport could not be used.
    #[error("transport error: {0}")]
    Transport(String),

    /// A single message did not reach the server.
    #[error("message could not be sent: {0}")]
    SendFailure(String),

    /// History or conversation list could not be fetched.
    #[error("fetch failed: {0}")]
    FetchFailure(String),
}

/// Invalid values for domain value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("user id must not be empty")]
    EmptyUserId,

    #[error("message id must not be empty")]
    EmptyMessageId,

    #[error("server record carries a temporary message id '{0}'")]
    TemporaryMessageId(String),
}

/// Errors raised while normalizing a wire record into a domain value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error(transparent)]
    InvalidValue(#[from] ValueObjectError),

    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("malformed frame: {0}")]
    MalformedFrame(String),
}

/// Errors raised by a transport connector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The endpoint URL could not be built.
    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),

    /// The server refused the handshake (e.g. an invalid credential).
    #[error("handshake rejected with HTTP status {0}")]
    Rejected(u16),

    /// Any other connect failure.
    #[error("connection error: {0}")]
    Connect(String),
}

/// Errors raised by the REST API client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The backend answered 401.
    #[error("credential rejected by the server")]
    Unauthorized,

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// The backend answered `success: false`.
    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Errors raised by the cross-tab bus.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BroadcastError {
    #[error("cross-tab channel '{0}' is closed")]
    Closed(String),

    #[error("cross-tab publish failed: {0}")]
    PublishFailed(String),
}

/// Errors raised while reading client storage.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to read client storage: {0}")]
    Io(#[from] std::io::Error),

    #[error("client storage is not a JSON object: {0}")]
    Format(String),
}
