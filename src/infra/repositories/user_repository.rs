//! User repository with an in-memory, dual-indexed store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{normalize_email, User};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// An edit applied to a stored user while the store is locked.
///
/// Returning an error aborts the edit and leaves the record untouched.
pub type UserChange = Box<dyn FnOnce(&mut User) -> AppResult<()> + Send>;

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Store a new user. Fails with `Conflict` if the email is taken.
    async fn insert(&self, user: User) -> AppResult<User>;

    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find user by email (case-insensitive)
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Apply `change` to the current record under the write lock, re-indexing
    /// the email if it changed. Returns the record before and after.
    async fn modify(&self, id: Uuid, change: UserChange) -> AppResult<(User, User)>;

    /// Remove a user from every index.
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Page through users ordered by creation time. Returns the page and the total count.
    async fn list(&self, offset: u64, limit: u64) -> AppResult<(Vec<User>, u64)>;

    /// Number of stored users
    async fn count(&self) -> AppResult<u64>;
}

#[derive(Default)]
struct Indexes {
    by_id: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
}

/// In-memory user store.
///
/// Both indexes live behind one lock so they can never disagree.
#[derive(Default)]
pub struct InMemoryUserStore {
    indexes: RwLock<Indexes>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserStore {
    async fn insert(&self, mut user: User) -> AppResult<User> {
        user.email = normalize_email(&user.email);

        let mut indexes = self.indexes.write().await;
        if indexes.by_email.contains_key(&user.email) {
            return Err(AppError::conflict("Email"));
        }
        if indexes.by_id.contains_key(&user.id) {
            return Err(AppError::conflict("User"));
        }

        indexes.by_email.insert(user.email.clone(), user.id);
        indexes.by_id.insert(user.id, user.clone());

        tracing::debug!(user_id = %user.id, "User stored");
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let indexes = self.indexes.read().await;
        Ok(indexes.by_id.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let email = normalize_email(email);
        let indexes = self.indexes.read().await;
        Ok(indexes
            .by_email
            .get(&email)
            .and_then(|id| indexes.by_id.get(id))
            .cloned())
    }

    async fn modify(&self, id: Uuid, change: UserChange) -> AppResult<(User, User)> {
        let mut indexes = self.indexes.write().await;
        let before = indexes.by_id.get(&id).cloned().ok_or(AppError::NotFound)?;

        let mut after = before.clone();
        change(&mut after)?;
        after.id = before.id;
        after.email = normalize_email(&after.email);

        if after.email != before.email {
            if indexes.by_email.contains_key(&after.email) {
                return Err(AppError::conflict("Email"));
            }
            indexes.by_email.remove(&before.email);
            indexes.by_email.insert(after.email.clone(), id);
        }

        indexes.by_id.insert(id, after.clone());
        Ok((before, after))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut indexes = self.indexes.write().await;
        let user = indexes.by_id.remove(&id).ok_or(AppError::NotFound)?;
        indexes.by_email.remove(&user.email);

        tracing::debug!(user_id = %id, "User removed");
        Ok(())
    }

    async fn list(&self, offset: u64, limit: u64) -> AppResult<(Vec<User>, u64)> {
        let indexes = self.indexes.read().await;
        let total = indexes.by_id.len() as u64;

        let mut users: Vec<&User> = indexes.by_id.values().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let page = users
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.indexes.read().await.by_id.len() as u64)
    }
}

/// Mock `modify` behaviour: run the change against a copy of `user`.
#[cfg(test)]
pub(crate) fn modify_copy_of(
    user: User,
) -> impl FnMut(Uuid, UserChange) -> AppResult<(User, User)> + Send + 'static {
    move |_, change| {
        let mut after = user.clone();
        change(&mut after)?;
        Ok((user.clone(), after))
    }
}
