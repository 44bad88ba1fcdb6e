//! Value objects of the chat domain.

use std::fmt;

use chrono::NaiveDate;
use tabiji_shared::time::{Clock, calendar_day};

use super::error::ValueObjectError;

/// Prefix marking a locally generated, not yet confirmed message id.
pub const TEMPORARY_ID_PREFIX: &str = "temp-";

/// Identifier of a user (the signed-in user or a counterpart).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    /// Create a new user id. Blank ids are rejected.
    pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValueObjectError::EmptyUserId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a message.
///
/// Either issued by the server or generated locally for an optimistic send
/// (`temp-<timestamp>-<random>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(String);

impl MessageId {
    /// Wrap an id issued by the server.
    ///
    /// Temporary ids never come back from the server, so an id carrying the
    /// temporary prefix is rejected.
    pub fn from_server(value: impl Into<String>) -> Result<Self, ValueObjectError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValueObjectError::EmptyMessageId);
        }
        if value.starts_with(TEMPORARY_ID_PREFIX) {
            return Err(ValueObjectError::TemporaryMessageId(value));
        }
        Ok(Self(value))
    }

    /// Generate a temporary id for an optimistic message.
    pub fn temporary(clock: &dyn Clock) -> Self {
        let random = uuid::Uuid::new_v4().simple().to_string();
        Self(format!(
            "{}{}-{}",
            TEMPORARY_ID_PREFIX,
            clock.now_millis(),
            &random[..8]
        ))
    }

    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMPORARY_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unix timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Calendar day (UTC), used by presentation layers to group messages.
    pub fn calendar_day(&self) -> Option<NaiveDate> {
        calendar_day(self.0)
    }
}

/// Identifier of one tab (one connection manager instance).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TabId(String);

impl TabId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::generate()
    }
}
