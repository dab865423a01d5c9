//! Password service - Reset flow and authenticated password changes.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use super::email_service::{notify, EmailService};
use crate::domain::{normalize_email, Password, PasswordResetToken, User};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{ResetTokenRepository, UserRepository};
use crate::utils::{EmailTemplate, TemplateContext};

#[async_trait]
pub trait PasswordService: Send + Sync {
    /// Email a reset token to `email`.
    ///
    /// Succeeds silently when no active account matches, so callers cannot
    /// discover which addresses are registered.
    async fn request_reset(&self, email: &str) -> AppResult<()>;

    /// Set a new password using a reset token. The token is spent even if
    /// the account turns out to be disabled.
    async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()>;

    /// Change the password of a signed-in user.
    async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()>;

    /// Drop expired and spent tokens.
    async fn purge_expired_tokens(&self) -> AppResult<usize>;
}

pub struct PasswordManager {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn ResetTokenRepository>,
    emails: Arc<dyn EmailService>,
    ttl: Duration,
}

impl PasswordManager {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn ResetTokenRepository>,
        emails: Arc<dyn EmailService>,
        ttl: Duration,
    ) -> Self {
        Self {
            users,
            tokens,
            emails,
            ttl,
        }
    }

    /// Hash `new_password` and store it, provided `check` still accepts the
    /// current record once the store is locked.
    async fn store_new_hash<F>(&self, user_id: Uuid, new_password: &str, check: F) -> AppResult<User>
    where
        F: FnOnce(&User) -> AppResult<()> + Send + 'static,
    {
        let hash = Password::new(new_password)?.into_string();
        let (_, user) = self
            .users
            .modify(
                user_id,
                Box::new(move |user: &mut User| {
                    check(user)?;
                    user.set_password_hash(hash);
                    Ok(())
                }),
            )
            .await?;
        self.tokens.revoke_for_user(user.id).await?;

        let context = TemplateContext::new()
            .with("username", &user.username)
            .with("email", &user.email);
        notify(self.emails.as_ref(), &user.email, EmailTemplate::PasswordChanged, context).await;

        Ok(user)
    }
}

#[async_trait]
impl PasswordService for PasswordManager {
    async fn request_reset(&self, email: &str) -> AppResult<()> {
        let email = normalize_email(email);
        let user = match self.users.find_by_email(&email).await? {
            Some(user) if user.is_active() => user,
            Some(user) => {
                tracing::info!(user_id = %user.id, status = %user.status, "Reset requested for disabled account");
                return Ok(());
            }
            None => {
                tracing::debug!("Reset requested for unknown email");
                return Ok(());
            }
        };

        // Only the newest token stays valid.
        self.tokens.revoke_for_user(user.id).await?;
        let token = PasswordResetToken::issue(user.id, self.ttl);
        let context = TemplateContext::new()
            .with("username", &user.username)
            .with("token", &token.token)
            .with("ttl_minutes", self.ttl.num_minutes());
        self.tokens.store(token).await?;

        notify(self.emails.as_ref(), &user.email, EmailTemplate::PasswordReset, context).await;
        tracing::info!(user_id = %user.id, "Password reset token issued");
        Ok(())
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        Password::validate(new_password)?;

        let record = self
            .tokens
            .consume(token, Utc::now())
            .await?
            .ok_or(AppError::InvalidResetToken)?;

        let user = self
            .store_new_hash(record.user_id, new_password, |user| {
                if user.is_active() {
                    Ok(())
                } else {
                    Err(AppError::AccountDisabled(user.status.to_string()))
                }
            })
            .await
            .map_err(|e| match e {
                AppError::NotFound => AppError::InvalidResetToken,
                e => e,
            })?;
        tracing::info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }

    async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        Password::validate(new_password)?;

        let user = self.users.find_by_id(user_id).await?.ok_or_not_found()?;
        if !Password::from_hash(user.password_hash.clone()).verify(current_password) {
            return Err(AppError::InvalidCredentials);
        }

        // A concurrent change or reset invalidates the password just checked.
        let verified = user.password_hash;
        self.store_new_hash(user_id, new_password, move |user| {
            if user.password_hash == verified {
                Ok(())
            } else {
                Err(AppError::InvalidCredentials)
            }
        })
        .await?;
        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    async fn purge_expired_tokens(&self) -> AppResult<usize> {
        let purged = self.tokens.purge_expired(Utc::now()).await?;
        if purged > 0 {
            tracing::debug!(purged, "Purged reset tokens");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::domain::UserStatus;
    use crate::infra::{modify_copy_of, MockResetTokenRepository, MockUserRepository};
    use crate::services::email_service::MockEmailService;

    fn active_user(password: &str) -> User {
        let hash = Password::new(password).unwrap().into_string();
        User::new("jdoe".into(), "jdoe@example.com", hash)
    }

    fn manager(
        users: MockUserRepository,
        tokens: MockResetTokenRepository,
        emails: MockEmailService,
    ) -> PasswordManager {
        PasswordManager::new(
            Arc::new(users),
            Arc::new(tokens),
            Arc::new(emails),
            Duration::minutes(30),
        )
    }

    #[tokio::test]
    async fn test_request_reset_issues_and_emails_token() {
        let user = User::new("jdoe".into(), "jdoe@example.com", "hash".into());
        let user_id = user.id;
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let mut tokens = MockResetTokenRepository::new();
        tokens
            .expect_revoke_for_user()
            .with(eq(user_id))
            .times(1)
            .returning(|_| Ok(0));
        tokens
            .expect_store()
            .withf(move |token| token.user_id == user_id && token.used_at.is_none())
            .times(1)
            .returning(|_| Ok(()));

        let mut emails = MockEmailService::new();
        emails
            .expect_send_template()
            .withf(|to, template, context| {
                to == "jdoe@example.com"
                    && *template == EmailTemplate::PasswordReset
                    && context.get("ttl_minutes") == Some("30")
                    && context.get("token").map(str::len) == Some(64)
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = manager(users, tokens, emails);
        service.request_reset("JDoe@example.com").await.unwrap();
    }

    #[tokio::test]
    async fn test_request_reset_unknown_email_is_silent() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        let mut tokens = MockResetTokenRepository::new();
        tokens.expect_store().never();
        let mut emails = MockEmailService::new();
        emails.expect_send_template().never();

        let service = manager(users, tokens, emails);
        assert!(service.request_reset("ghost@example.com").await.is_ok());
    }

    #[tokio::test]
    async fn test_request_reset_suspended_account_is_silent() {
        let mut user = User::new("jdoe".into(), "jdoe@example.com", "hash".into());
        user.status = UserStatus::Suspended;
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        let mut tokens = MockResetTokenRepository::new();
        tokens.expect_store().never();

        let service = manager(users, tokens, MockEmailService::new());
        assert!(service.request_reset("jdoe@example.com").await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_password_with_valid_token() {
        let user = active_user("OldPass123!");
        let user_id = user.id;
        let mut users = MockUserRepository::new();
        users
            .expect_modify()
            .withf(move |id, _| *id == user_id)
            .times(1)
            .returning(modify_copy_of(user));

        let mut tokens = MockResetTokenRepository::new();
        tokens
            .expect_consume()
            .withf(|token, _| token == "tok")
            .returning(move |_, _| Ok(Some(PasswordResetToken::issue(user_id, Duration::minutes(5)))));
        tokens
            .expect_revoke_for_user()
            .with(eq(user_id))
            .times(1)
            .returning(|_| Ok(1));

        let mut emails = MockEmailService::new();
        emails
            .expect_send_template()
            .withf(|_, template, _| *template == EmailTemplate::PasswordChanged)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = manager(users, tokens, emails);
        service.reset_password("tok", "NewPass123!").await.unwrap();
    }

    #[tokio::test]
    async fn test_reset_password_invalid_token() {
        let mut tokens = MockResetTokenRepository::new();
        tokens.expect_consume().returning(|_, _| Ok(None));
        let mut users = MockUserRepository::new();
        users.expect_modify().never();

        let service = manager(users, tokens, MockEmailService::new());
        let result = service.reset_password("bogus", "NewPass123!").await;

        assert!(matches!(result, Err(AppError::InvalidResetToken)));
    }

    #[tokio::test]
    async fn test_reset_password_weak_password_keeps_token() {
        let mut tokens = MockResetTokenRepository::new();
        tokens.expect_consume().never();

        let service = manager(MockUserRepository::new(), tokens, MockEmailService::new());
        let result = service.reset_password("tok", "short").await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_reset_password_for_deleted_user() {
        let mut tokens = MockResetTokenRepository::new();
        tokens
            .expect_consume()
            .returning(|_, _| Ok(Some(PasswordResetToken::issue(Uuid::new_v4(), Duration::minutes(5)))));
        let mut users = MockUserRepository::new();
        users.expect_modify().returning(|_, _| Err(AppError::NotFound));

        let service = manager(users, tokens, MockEmailService::new());
        let result = service.reset_password("tok", "NewPass123!").await;

        assert!(matches!(result, Err(AppError::InvalidResetToken)));
    }

    #[tokio::test]
    async fn test_reset_password_for_suspended_user_keeps_hash() {
        let mut user = active_user("OldPass123!");
        user.status = UserStatus::Suspended;
        let user_id = user.id;
        let mut tokens = MockResetTokenRepository::new();
        tokens
            .expect_consume()
            .returning(move |_, _| Ok(Some(PasswordResetToken::issue(user_id, Duration::minutes(5)))));
        tokens.expect_revoke_for_user().never();
        let mut users = MockUserRepository::new();
        users.expect_modify().returning(modify_copy_of(user));
        let mut emails = MockEmailService::new();
        emails.expect_send_template().never();

        let service = manager(users, tokens, emails);
        let result = service.reset_password("tok", "NewPass123!").await;

        assert!(matches!(result, Err(AppError::AccountDisabled(status)) if status == "suspended"));
    }

    #[tokio::test]
    async fn test_change_password_requires_current_password() {
        let user = active_user("OldPass123!");
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        users.expect_modify().never();

        let service = manager(users, MockResetTokenRepository::new(), MockEmailService::new());
        let result = service
            .change_password(Uuid::new_v4(), "WrongPass123!", "NewPass123!")
            .await;

        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_change_password_success() {
        let user = active_user("OldPass123!");
        let mut users = MockUserRepository::new();
        let found = user.clone();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        users.expect_modify().times(1).returning(modify_copy_of(user));
        let mut tokens = MockResetTokenRepository::new();
        tokens.expect_revoke_for_user().returning(|_| Ok(0));
        let mut emails = MockEmailService::new();
        emails.expect_send_template().returning(|_, _, _| Ok(()));

        let service = manager(users, tokens, emails);
        let result = service
            .change_password(Uuid::new_v4(), "OldPass123!", "NewPass123!")
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_change_password_loses_to_concurrent_change() {
        let user = active_user("OldPass123!");
        let mut changed_meanwhile = user.clone();
        changed_meanwhile.set_password_hash(Password::new("OtherPass123!").unwrap().into_string());

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(user.clone())));
        users
            .expect_modify()
            .times(1)
            .returning(modify_copy_of(changed_meanwhile));
        let mut tokens = MockResetTokenRepository::new();
        tokens.expect_revoke_for_user().never();

        let service = manager(users, tokens, MockEmailService::new());
        let result = service
            .change_password(Uuid::new_v4(), "OldPass123!", "NewPass123!")
            .await;

        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }
}
