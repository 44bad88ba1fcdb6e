//! InMemory Chat Repository 実装
//!
//! ドメイン層が定義する ChatRepository trait の具体的な実装。
//! ユーザーは起動時に seed として与え、メッセージは Vec に追記していく。

use std::{collections::HashMap, str::FromStr};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, ChatRepository, ConversationView, RepositoryError, Timestamp, User, UserId,
};

/// 起動時に登録するユーザー（`id:Name:token` 形式）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedUser {
    pub id: UserId,
    pub name: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("seed user must look like 'id:Name:token', got '{0}'")]
pub struct SeedUserParseError(String);

impl FromStr for SeedUser {
    type Err = SeedUserParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.splitn(3, ':');
        let (Some(id), Some(name), Some(token)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(SeedUserParseError(value.to_string()));
        };
        if name.trim().is_empty() || token.trim().is_empty() {
            return Err(SeedUserParseError(value.to_string()));
        }
        let id = UserId::new(id).map_err(|_| SeedUserParseError(value.to_string()))?;
        Ok(Self {
            id,
            name: name.to_string(),
            token: token.to_string(),
        })
    }
}

#[derive(Default)]
struct Store {
    users: HashMap<UserId, User>,
    tokens: HashMap<String, UserId>,
    messages: Vec<ChatMessage>,
    last_seen: HashMap<UserId, Timestamp>,
}

/// インメモリ Chat Repository 実装
#[derive(Default)]
pub struct InMemoryChatRepository {
    store: Mutex<Store>,
}

impl InMemoryChatRepository {
    pub fn new(seeds: impl IntoIterator<Item = SeedUser>) -> Self {
        let mut store = Store::default();
        for seed in seeds {
            store.tokens.insert(seed.token, seed.id.clone());
            store.users.insert(
                seed.id.clone(),
                User {
                    id: seed.id,
                    name: seed.name,
                    avatar: None,
                },
            );
        }
        Self {
            store: Mutex::new(store),
        }
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn authenticate(&self, token: &str) -> Option<User> {
        let store = self.store.lock().await;
        store
            .tokens
            .get(token)
            .and_then(|user_id| store.users.get(user_id))
            .cloned()
    }

    async fn find_user(&self, user_id: &UserId) -> Option<User> {
        self.store.lock().await.users.get(user_id).cloned()
    }

    async fn list_users(&self) -> Vec<User> {
        let store = self.store.lock().await;
        let mut users: Vec<User> = store.users.values().cloned().collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        users
    }

    async fn add_message(&self, message: ChatMessage) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().await;
        for user_id in [&message.sender_id, &message.receiver_id] {
            if !store.users.contains_key(user_id) {
                return Err(RepositoryError::UserNotFound(user_id.as_str().to_string()));
            }
        }
        store.messages.push(message);
        Ok(())
    }

    async fn history(&self, me: &UserId, counterpart: &UserId) -> Vec<ChatMessage> {
        let store = self.store.lock().await;
        store
            .messages
            .iter()
            .rev()
            .filter(|message| message.is_between(me, counterpart))
            .cloned()
            .collect()
    }

    async fn mark_read(&self, reader: &UserId, counterpart: &UserId) -> usize {
        let mut store = self.store.lock().await;
        let mut marked = 0;
        for message in store.messages.iter_mut() {
            if message.receiver_id == *reader
                && message.sender_id == *counterpart
                && !message.is_read
            {
                message.is_read = true;
                marked += 1;
            }
        }
        marked
    }

    async fn conversations(&self, me: &UserId) -> Vec<ConversationView> {
        let store = self.store.lock().await;

        // 相手ごとに最新メッセージと未読数を集計（messages は古い順）
        let mut latest: HashMap<&UserId, (&ChatMessage, u32)> = HashMap::new();
        for message in &store.messages {
            let Some(counterpart) = message.counterpart_of(me) else {
                continue;
            };
            let unread = u32::from(
                message.receiver_id == *me && message.sender_id != *me && !message.is_read,
            );
            latest
                .entry(counterpart)
                .and_modify(|(last, count)| {
                    *last = message;
                    *count += unread;
                })
                .or_insert((message, unread));
        }

        let mut conversations: Vec<ConversationView> = latest
            .into_iter()
            .filter_map(|(counterpart, (last, unread_count))| {
                let user = store.users.get(counterpart)?;
                Some(ConversationView {
                    counterpart: user.clone(),
                    last_message: Some(last.clone()),
                    unread_count,
                    is_self: counterpart == me,
                })
            })
            .collect();
        conversations.sort_by_key(|view| {
            std::cmp::Reverse(view.last_message.as_ref().map(|m| m.created_at))
        });
        conversations
    }

    async fn set_last_seen(&self, user_id: &UserId, at: Timestamp) {
        self.store
            .lock()
            .await
            .last_seen
            .insert(user_id.clone(), at);
    }

    async fn last_seen(&self, user_id: &UserId) -> Option<Timestamp> {
        self.store.lock().await.last_seen.get(user_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageContent;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn seeded() -> InMemoryChatRepository {
        InMemoryChatRepository::new([
            "alice:Alice:tok-a".parse().unwrap(),
            "bob:Bob:tok-b".parse().unwrap(),
            "carol:Carol:tok-c".parse().unwrap(),
        ])
    }

    fn message(from: &str, to: &str, content: &str, at: i64) -> ChatMessage {
        ChatMessage::new(
            user(from),
            user(to),
            MessageContent::new(content).unwrap(),
            Timestamp::new(at),
        )
    }

    #[test]
    fn test_seed_user_parsing() {
        // テスト項目: `id:Name:token` 形式が解析でき、不正な形式は拒否される
        // given (前提条件) / when (操作):
        let seed: SeedUser = "u1:Kenji Tanaka:secret:with:colons".parse().unwrap();

        // then (期待する結果):
        assert_eq!(seed.id, user("u1"));
        assert_eq!(seed.name, "Kenji Tanaka");
        assert_eq!(seed.token, "secret:with:colons");
        assert!("u1:Kenji".parse::<SeedUser>().is_err());
        assert!(":Kenji:tok".parse::<SeedUser>().is_err());
    }

    #[tokio::test]
    async fn test_authenticate_by_token() {
        // テスト項目: token から対応するユーザーが求まり、未知の token は拒否される
        // given (前提条件):
        let repository = seeded();

        // when (操作) / then (期待する結果):
        assert_eq!(repository.authenticate("tok-b").await.map(|u| u.id), Some(user("bob")));
        assert_eq!(repository.authenticate("nope").await, None);
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_mark_read() {
        // テスト項目: 履歴は新しい順で返り、mark_read で相手からの未読のみ既読になる
        // given (前提条件):
        let repository = seeded();
        repository.add_message(message("alice", "bob", "1", 1)).await.unwrap();
        repository.add_message(message("bob", "alice", "2", 2)).await.unwrap();
        repository.add_message(message("carol", "alice", "x", 3)).await.unwrap();
        repository.add_message(message("bob", "alice", "3", 4)).await.unwrap();

        // when (操作):
        let history = repository.history(&user("alice"), &user("bob")).await;
        let marked = repository.mark_read(&user("alice"), &user("bob")).await;

        // then (期待する結果):
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["3", "2", "1"]);
        assert_eq!(marked, 2);
        let conversations = repository.conversations(&user("alice")).await;
        let unread: Vec<(String, u32)> = conversations
            .iter()
            .map(|c| (c.counterpart.id.as_str().to_string(), c.unread_count))
            .collect();
        assert_eq!(unread, vec![("bob".to_string(), 0), ("carol".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_conversations_include_self_conversation() {
        // テスト項目: 自分宛てのメッセージは is_self の会話としてまとめられる
        // given (前提条件):
        let repository = seeded();
        repository.add_message(message("alice", "alice", "note", 1)).await.unwrap();

        // when (操作):
        let conversations = repository.conversations(&user("alice")).await;

        // then (期待する結果):
        assert_eq!(conversations.len(), 1);
        assert!(conversations[0].is_self);
        assert_eq!(conversations[0].unread_count, 0);
    }

    #[tokio::test]
    async fn test_add_message_to_unknown_user_fails() {
        // テスト項目: 存在しないユーザー宛てのメッセージは保存されない
        // given (前提条件):
        let repository = seeded();

        // when (操作):
        let result = repository.add_message(message("alice", "mallory", "hi", 1)).await;

        // then (期待する結果):
        assert_eq!(result, Err(RepositoryError::UserNotFound("mallory".to_string())));
        assert!(repository.history(&user("alice"), &user("mallory")).await.is_empty());
    }
}
