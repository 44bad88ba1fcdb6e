//! UseCase: bearer token によるユーザー認証

use std::sync::Arc;

use crate::domain::{ChatRepository, User};

use super::error::AuthError;

/// 認証のユースケース
pub struct AuthenticateUseCase {
    repository: Arc<dyn ChatRepository>,
}

impl AuthenticateUseCase {
    pub fn new(repository: Arc<dyn ChatRepository>) -> Self {
        Self { repository }
    }

    /// token に対応するユーザーを返す
    pub async fn execute(&self, token: &str) -> Result<User, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::InvalidToken);
        }
        self.repository
            .authenticate(token)
            .await
            .ok_or(AuthError::InvalidToken)
    }
}
