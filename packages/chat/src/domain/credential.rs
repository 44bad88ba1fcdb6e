//! Credential store trait.

/// Key of the bearer credential in client storage.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Synchronously readable source of the bearer credential.
///
/// The value is written by an external login flow; the chat core only reads it.
/// `None` means the user is not signed in.
pub trait CredentialStore: Send + Sync {
    fn auth_token(&self) -> Option<String>;
}
