//! Credential store backed by a JSON client-storage file.
//!
//! The file is a flat JSON object, like a browser's local storage:
//!
//! ```json
//! { "auth_token": "eyJhbGciOi..." }
//! ```
//!
//! It is read on every lookup so a login flow writing the file is picked up
//! without restarting.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::domain::{AUTH_TOKEN_KEY, CredentialError, CredentialStore};

#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read one string value from the storage file.
    pub fn read_value(&self, key: &str) -> Result<Option<String>, CredentialError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let entries: HashMap<String, serde_json::Value> =
            serde_json::from_str(&raw).map_err(|e| CredentialError::Format(e.to_string()))?;
        Ok(entries
            .get(key)
            .and_then(|value| value.as_str())
            .map(str::to_owned))
    }
}

impl CredentialStore for FileCredentialStore {
    fn auth_token(&self) -> Option<String> {
        match self.read_value(AUTH_TOKEN_KEY) {
            Ok(token) => token.filter(|token| !token.trim().is_empty()),
            Err(e) => {
                tracing::warn!(
                    "Cannot read credential from {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }
}
