//! Presence tracking.

use std::collections::HashMap;

use super::value_object::{Timestamp, UserId};

/// Online/offline status of one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Presence {
    pub is_online: bool,
    /// Only meaningful while offline.
    pub last_seen: Option<Timestamp>,
}

/// A presence change pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceUpdate {
    pub user_id: UserId,
    pub is_online: bool,
    pub last_seen: Option<Timestamp>,
}

/// Maps users to their latest known presence.
///
/// Entries are created by inbound events only and live for the whole session.
#[derive(Debug, Clone, Default)]
pub struct PresenceTracker {
    entries: HashMap<UserId, Presence>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a presence update. Going online clears `last_seen`.
    pub fn apply(&mut self, update: &PresenceUpdate) {
        let presence = if update.is_online {
            Presence {
                is_online: true,
                last_seen: None,
            }
        } else {
            Presence {
                is_online: false,
                last_seen: update.last_seen,
            }
        };
        tracing::trace!(
            "Presence of '{}' is now {}",
            update.user_id,
            if presence.is_online { "online" } else { "offline" }
        );
        self.entries.insert(update.user_id.clone(), presence);
    }

    pub fn get(&self, user_id: &UserId) -> Option<&Presence> {
        self.entries.get(user_id)
    }

    /// Unknown users are treated as offline.
    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.entries
            .get(user_id)
            .is_some_and(|presence| presence.is_online)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(id: &str, is_online: bool, last_seen: Option<i64>) -> PresenceUpdate {
        PresenceUpdate {
            user_id: UserId::new(id).unwrap(),
            is_online,
            last_seen: last_seen.map(Timestamp::new),
        }
    }

    #[test]
    fn test_unknown_user_is_offline() {
        // テスト項目: 未知のユーザーはオフライン扱いになる
        // given (前提条件):
        let tracker = PresenceTracker::new();

        // when (操作):
        let online = tracker.is_online(&UserId::new("ghost").unwrap());

        // then (期待する結果):
        assert!(!online);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_going_offline_records_last_seen() {
        // テスト項目: オフラインになると最終閲覧時刻が記録される
        // given (前提条件):
        let mut tracker = PresenceTracker::new();

        // when (操作):
        tracker.apply(&update("bob", false, Some(5000)));

        // then (期待する結果):
        let presence = tracker.get(&UserId::new("bob").unwrap()).unwrap();
        assert!(!presence.is_online);
        assert_eq!(presence.last_seen, Some(Timestamp::new(5000)));
    }

    #[test]
    fn test_going_online_clears_last_seen() {
        // テスト項目: オンラインになると最終閲覧時刻がクリアされる
        // given (前提条件):
        let mut tracker = PresenceTracker::new();
        tracker.apply(&update("bob", false, Some(5000)));

        // when (操作):
        tracker.apply(&update("bob", true, Some(9000)));

        // then (期待する結果):
        let presence = tracker.get(&UserId::new("bob").unwrap()).unwrap();
        assert!(presence.is_online);
        assert_eq!(presence.last_seen, None);
        assert_eq!(tracker.len(), 1);
    }
}
