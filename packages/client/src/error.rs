//! Error types for the terminal front-end.

use tabiji_chat::ChatError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// No usable credential in the client storage file
    #[error("no auth token found in '{0}', sign in first")]
    MissingCredential(String),

    /// The chat core refused an operation
    #[error(transparent)]
    Chat(#[from] ChatError),
}
