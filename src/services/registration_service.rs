//! Registration service - Account creation.

use std::sync::Arc;

use async_trait::async_trait;

use super::email_service::{notify, EmailService};
use crate::domain::{validate_email, validate_username, Password, RegisterUser, User, UserRole};
use crate::errors::{AppError, AppResult};
use crate::infra::UserRepository;
use crate::utils::{EmailTemplate, TemplateContext};

/// Username given to a seeded admin account.
const SEED_ADMIN_USERNAME: &str = "admin";

#[async_trait]
pub trait RegistrationService: Send + Sync {
    /// Create an active user and queue a welcome email.
    async fn register(&self, input: RegisterUser) -> AppResult<User>;

    /// Make sure an admin account exists for `email`.
    ///
    /// An existing account is promoted; otherwise a new admin is created.
    async fn seed_admin(&self, email: &str, password: &str) -> AppResult<User>;
}

pub struct Registrar {
    users: Arc<dyn UserRepository>,
    emails: Arc<dyn EmailService>,
}

impl Registrar {
    pub fn new(users: Arc<dyn UserRepository>, emails: Arc<dyn EmailService>) -> Self {
        Self { users, emails }
    }
}

#[async_trait]
impl RegistrationService for Registrar {
    async fn register(&self, input: RegisterUser) -> AppResult<User> {
        validate_username(&input.username)?;
        validate_email(&input.email)?;
        Password::validate(&input.password)?;

        // Cheap early exit; the store re-checks under its write lock.
        if self.users.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::conflict("Email"));
        }

        let password_hash = Password::new(&input.password)?.into_string();
        let user = self
            .users
            .insert(User::new(input.username, &input.email, password_hash))
            .await?;
        tracing::info!(user_id = %user.id, "User registered");

        let context = TemplateContext::new()
            .with("username", &user.username)
            .with("email", &user.email);
        notify(self.emails.as_ref(), &user.email, EmailTemplate::Welcome, context).await;

        Ok(user)
    }

    async fn seed_admin(&self, email: &str, password: &str) -> AppResult<User> {
        validate_email(email)?;

        if let Some(user) = self.users.find_by_email(email).await? {
            if user.is_admin() {
                return Ok(user);
            }
            let (_, user) = self
                .users
                .modify(
                    user.id,
                    Box::new(|user: &mut User| {
                        user.set_role(UserRole::Admin);
                        Ok(())
                    }),
                )
                .await?;
            tracing::info!(user_id = %user.id, "Existing user promoted to admin");
            return Ok(user);
        }

        let password_hash = Password::new(password)?.into_string();
        let mut user = User::new(SEED_ADMIN_USERNAME.to_string(), email, password_hash);
        user.role = UserRole::Admin;
        let user = self.users.insert(user).await?;
        tracing::info!(user_id = %user.id, "Admin account created");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{modify_copy_of, MockUserRepository};
    use crate::services::email_service::MockEmailService;

    fn registration(username: &str, email: &str, password: &str) -> RegisterUser {
        RegisterUser {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_success_sends_welcome() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users.expect_insert().times(1).returning(Ok);

        let mut emails = MockEmailService::new();
        emails
            .expect_send_template()
            .withf(|to, template, context| {
                to == "jdoe@example.com"
                    && *template == EmailTemplate::Welcome
                    && context.get("username") == Some("jdoe")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = Registrar::new(Arc::new(users), Arc::new(emails));
        let user = service
            .register(registration("jdoe", "JDoe@Example.com", "SecurePass123!"))
            .await
            .unwrap();

        assert_eq!(user.email, "jdoe@example.com");
        assert_ne!(user.password_hash, "SecurePass123!");
        assert!(Password::from_hash(user.password_hash).verify("SecurePass123!"));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|email| {
            Ok(Some(User::new("other".into(), email, "hash".into())))
        });
        users.expect_insert().never();

        let service = Registrar::new(Arc::new(users), Arc::new(MockEmailService::new()));
        let result = service
            .register(registration("jdoe", "jdoe@example.com", "SecurePass123!"))
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_short_password_before_lookup() {
        let users = MockUserRepository::new();
        let service = Registrar::new(Arc::new(users), Arc::new(MockEmailService::new()));

        let result = service
            .register(registration("jdoe", "jdoe@example.com", "short"))
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_bad_username_and_email() {
        let service = Registrar::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(MockEmailService::new()),
        );

        let bad_name = service
            .register(registration("a b", "jdoe@example.com", "SecurePass123!"))
            .await;
        let bad_email = service
            .register(registration("jdoe", "not-an-email", "SecurePass123!"))
            .await;

        assert!(matches!(bad_name, Err(AppError::Validation(_))));
        assert!(matches!(bad_email, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_succeeds_when_email_queue_fails() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users.expect_insert().returning(Ok);

        let mut emails = MockEmailService::new();
        emails
            .expect_send_template()
            .returning(|_, _, _| Err(AppError::internal("Email queue is closed")));

        let service = Registrar::new(Arc::new(users), Arc::new(emails));
        let result = service
            .register(registration("jdoe", "jdoe@example.com", "SecurePass123!"))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_seed_admin_creates_account() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users.expect_insert().times(1).returning(Ok);

        let mut emails = MockEmailService::new();
        emails.expect_send_template().never();

        let service = Registrar::new(Arc::new(users), Arc::new(emails));
        let admin = service
            .seed_admin("admin@example.com", "AdminPass123!")
            .await
            .unwrap();

        assert!(admin.is_admin());
        assert_eq!(admin.username, "admin");
    }

    #[tokio::test]
    async fn test_seed_admin_promotes_existing_user() {
        let mut users = MockUserRepository::new();
        let boss = User::new("boss".into(), "boss@example.com", "hash".into());
        let found = boss.clone();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(found.clone())));
        users.expect_modify().times(1).returning(modify_copy_of(boss));
        users.expect_insert().never();

        let service = Registrar::new(Arc::new(users), Arc::new(MockEmailService::new()));
        let admin = service
            .seed_admin("boss@example.com", "AdminPass123!")
            .await
            .unwrap();

        assert!(admin.is_admin());
        assert_eq!(admin.username, "boss");
    }
}
