//! User service - Lookup and maintenance of existing users.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::email_service::{notify, EmailService};
use crate::config::is_valid_role;
use crate::domain::{validate_email, validate_username, UpdateUser, User, UserRole, UserStatus};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{ResetTokenRepository, UserRepository};
use crate::types::{Paginated, PaginationParams};
use crate::utils::{EmailTemplate, TemplateContext};

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    async fn get_user(&self, id: Uuid) -> AppResult<User>;

    async fn get_user_by_email(&self, email: &str) -> AppResult<User>;

    async fn list_users(&self, params: &PaginationParams) -> AppResult<Paginated<User>>;

    /// Apply a partial update. Role strings are validated here.
    async fn update_user(&self, id: Uuid, changes: UpdateUser) -> AppResult<User>;

    /// Change account status, notifying the user if it actually changed.
    async fn set_status(&self, id: Uuid, status: UserStatus) -> AppResult<User>;

    /// Remove the user and any outstanding reset tokens.
    async fn delete_user(&self, id: Uuid) -> AppResult<()>;

    async fn count_users(&self) -> AppResult<u64>;
}

/// Concrete implementation of UserService.
pub struct UserManager {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn ResetTokenRepository>,
    emails: Arc<dyn EmailService>,
}

impl UserManager {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn ResetTokenRepository>,
        emails: Arc<dyn EmailService>,
    ) -> Self {
        Self {
            users,
            tokens,
            emails,
        }
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.users.find_by_id(id).await?.ok_or_not_found()
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<User> {
        self.users.find_by_email(email).await?.ok_or_not_found()
    }

    async fn list_users(&self, params: &PaginationParams) -> AppResult<Paginated<User>> {
        let (users, total) = self.users.list(params.offset(), params.limit()).await?;
        Ok(Paginated::new(users, params.page(), params.limit(), total))
    }

    async fn update_user(&self, id: Uuid, changes: UpdateUser) -> AppResult<User> {
        if changes.is_empty() {
            return Err(AppError::validation("No fields to update"));
        }
        if let Some(ref username) = changes.username {
            validate_username(username)?;
        }
        if let Some(ref email) = changes.email {
            validate_email(email)?;
        }
        if let Some(ref role) = changes.role {
            if !is_valid_role(role) {
                return Err(AppError::validation("Invalid role. Must be 'user' or 'admin'"));
            }
        }

        let (_, user) = self
            .users
            .modify(
                id,
                Box::new(move |user: &mut User| {
                    if let Some(username) = changes.username {
                        user.set_username(username);
                    }
                    if let Some(email) = changes.email {
                        user.set_email(&email);
                    }
                    if let Some(role) = changes.role {
                        user.set_role(UserRole::from(role.as_str()));
                    }
                    Ok(())
                }),
            )
            .await?;
        tracing::info!(user_id = %id, "User updated");
        Ok(user)
    }

    async fn set_status(&self, id: Uuid, status: UserStatus) -> AppResult<User> {
        let (before, user) = self
            .users
            .modify(
                id,
                Box::new(move |user: &mut User| {
                    if user.status != status {
                        user.set_status(status);
                    }
                    Ok(())
                }),
            )
            .await?;
        let previous = before.status;
        if previous == status {
            return Ok(user);
        }

        tracing::info!(user_id = %id, from = %previous, to = %status, "User status changed");

        let context = TemplateContext::new()
            .with("username", &user.username)
            .with("previous_status", previous)
            .with("status", status);
        notify(self.emails.as_ref(), &user.email, EmailTemplate::StatusChanged, context).await;

        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<()> {
        self.users.delete(id).await?;
        let revoked = self.tokens.revoke_for_user(id).await?;
        tracing::info!(user_id = %id, revoked_tokens = revoked, "User deleted");
        Ok(())
    }

    async fn count_users(&self) -> AppResult<u64> {
        self.users.count().await
    }
}
