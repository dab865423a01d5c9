//! Password reset token storage.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::PasswordResetToken;
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ResetTokenRepository: Send + Sync {
    async fn store(&self, token: PasswordResetToken) -> AppResult<()>;

    async fn find(&self, token: &str) -> AppResult<Option<PasswordResetToken>>;

    /// Atomically mark a token used if it is still usable at `now`.
    /// Returns the token when it was consumed, `None` if unknown, used or expired.
    async fn consume(&self, token: &str, now: DateTime<Utc>) -> AppResult<Option<PasswordResetToken>>;

    /// Drop every token issued to `user_id`. Returns how many were dropped.
    async fn revoke_for_user(&self, user_id: Uuid) -> AppResult<usize>;

    /// Drop expired and used tokens. Returns how many were dropped.
    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<usize>;
}

#[derive(Default)]
pub struct InMemoryResetTokenStore {
    tokens: RwLock<HashMap<String, PasswordResetToken>>,
}

impl InMemoryResetTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResetTokenRepository for InMemoryResetTokenStore {
    async fn store(&self, token: PasswordResetToken) -> AppResult<()> {
        self.tokens.write().await.insert(token.token.clone(), token);
        Ok(())
    }

    async fn find(&self, token: &str) -> AppResult<Option<PasswordResetToken>> {
        Ok(self.tokens.read().await.get(token).cloned())
    }

    async fn consume(&self, token: &str, now: DateTime<Utc>) -> AppResult<Option<PasswordResetToken>> {
        let mut tokens = self.tokens.write().await;
        match tokens.get_mut(token) {
            Some(record) if record.is_usable(now) => {
                record.used_at = Some(now);
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn revoke_for_user(&self, user_id: Uuid) -> AppResult<usize> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, t| t.user_id != user_id);
        Ok(before - tokens.len())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, t| t.is_usable(now));
        Ok(before - tokens.len())
    }
}
