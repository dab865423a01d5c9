//! Authentication service - Login and JWT handling.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{Config, SECONDS_PER_HOUR, TOKEN_TYPE_BEARER};
use crate::domain::{normalize_email, Password, User};
use crate::errors::{AppError, AppResult};
use crate::infra::UserRepository;

/// JWT claims payload
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Token response returned after successful authentication
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// JWT access token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Token expiration time in seconds
    #[schema(example = 86400)]
    pub expires_in: i64,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Check credentials and issue a token.
    ///
    /// Unknown emails and wrong passwords both yield `InvalidCredentials`.
    /// A disabled account is only reported once the password matched.
    async fn login(&self, email: &str, password: &str) -> AppResult<TokenResponse>;

    /// Verify JWT token and extract claims
    fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

fn generate_token(user: &User, config: &Config) -> AppResult<TokenResponse> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.jwt_expiration_hours);

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role.to_string(),
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )?;

    Ok(TokenResponse {
        access_token: token,
        token_type: TOKEN_TYPE_BEARER.to_string(),
        expires_in: config.jwt_expiration_hours * SECONDS_PER_HOUR,
    })
}

pub struct Authenticator {
    users: Arc<dyn UserRepository>,
    config: Config,
}

impl Authenticator {
    pub fn new(users: Arc<dyn UserRepository>, config: Config) -> Self {
        Self { users, config }
    }
}

#[async_trait]
impl AuthService for Authenticator {
    async fn login(&self, email: &str, password: &str) -> AppResult<TokenResponse> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            Password::verify_dummy(password);
            tracing::debug!("Login attempt for unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !Password::from_hash(user.password_hash.clone()).verify(password) {
            tracing::debug!(user_id = %user.id, "Login attempt with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        if !user.is_active() {
            tracing::info!(user_id = %user.id, status = %user.status, "Login refused for disabled account");
            return Err(AppError::AccountDisabled(user.status.to_string()));
        }

        // The status may have changed since the lookup; re-check it under the lock.
        let (_, user) = self
            .users
            .modify(
                user.id,
                Box::new(|user: &mut User| {
                    if !user.is_active() {
                        return Err(AppError::AccountDisabled(user.status.to_string()));
                    }
                    user.record_login();
                    Ok(())
                }),
            )
            .await
            .map_err(|e| match e {
                AppError::NotFound => AppError::InvalidCredentials,
                e => e,
            })?;
        tracing::info!(user_id = %user.id, "User logged in");

        generate_token(&user, &self.config)
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserStatus;
    use crate::infra::{modify_copy_of, MockUserRepository};

    const SECRET: &str = "test-secret-key-for-testing-only-32chars";

    fn config() -> Config {
        Config::with_secret(SECRET).unwrap()
    }

    fn stored_user(password: &str, status: UserStatus) -> User {
        let hash = Password::new(password).unwrap().into_string();
        let mut user = User::new("jdoe".into(), "jdoe@example.com", hash);
        user.status = status;
        user
    }

    #[tokio::test]
    async fn test_login_issues_verifiable_token() {
        let user = stored_user("SecurePass123!", UserStatus::Active);
        let user_id = user.id;
        let mut users = MockUserRepository::new();
        let found = user.clone();
        users
            .expect_find_by_email()
            .withf(|email| email == "jdoe@example.com")
            .returning(move |_| Ok(Some(found.clone())));
        users
            .expect_modify()
            .times(1)
            .returning(modify_copy_of(user.clone()));

        let auth = Authenticator::new(Arc::new(users), config());
        let token = auth.login(" JDoe@example.com", "SecurePass123!").await.unwrap();

        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, 24 * 3600);
        let claims = auth.verify_token(&token.access_token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, "user");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let user = stored_user("SecurePass123!", UserStatus::Active);
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        users.expect_modify().never();

        let auth = Authenticator::new(Arc::new(users), config());
        let result = auth.login("jdoe@example.com", "WrongPass123!").await;

        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_unknown_email_matches_wrong_password() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));

        let auth = Authenticator::new(Arc::new(users), config());
        let result = auth.login("ghost@example.com", "SecurePass123!").await;

        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_suspended_account() {
        let user = stored_user("SecurePass123!", UserStatus::Suspended);
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let auth = Authenticator::new(Arc::new(users), config());
        let result = auth.login("jdoe@example.com", "SecurePass123!").await;

        match result {
            Err(AppError::AccountDisabled(status)) => assert_eq!(status, "suspended"),
            other => panic!("unexpected result: {:?}", other.map(|t| t.token_type)),
        }
    }

    #[tokio::test]
    async fn test_disabled_account_with_wrong_password_is_invalid_credentials() {
        let user = stored_user("SecurePass123!", UserStatus::Inactive);
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let auth = Authenticator::new(Arc::new(users), config());
        let result = auth.login("jdoe@example.com", "nope-nope-nope").await;

        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_suspended_after_lookup_is_refused() {
        let user = stored_user("SecurePass123!", UserStatus::Active);
        let mut suspended = user.clone();
        suspended.status = UserStatus::Suspended;

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        users
            .expect_modify()
            .times(1)
            .returning(modify_copy_of(suspended));

        let auth = Authenticator::new(Arc::new(users), config());
        let result = auth.login("jdoe@example.com", "SecurePass123!").await;

        assert!(matches!(result, Err(AppError::AccountDisabled(_))));
    }

    #[tokio::test]
    async fn test_login_deleted_after_lookup_is_invalid_credentials() {
        let user = stored_user("SecurePass123!", UserStatus::Active);
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        users
            .expect_modify()
            .returning(|_, _| Err(AppError::NotFound));

        let auth = Authenticator::new(Arc::new(users), config());
        let result = auth.login("jdoe@example.com", "SecurePass123!").await;

        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[test]
    fn test_verify_token_rejects_garbage_and_foreign_secret() {
        let auth = Authenticator::new(Arc::new(MockUserRepository::new()), config());
        assert!(matches!(auth.verify_token("not.a.jwt"), Err(AppError::Jwt(_))));

        let other = Config::with_secret("another-secret-key-that-is-32-chars-long").unwrap();
        let user = User::new("jdoe".into(), "jdoe@example.com", "hash".into());
        let foreign = generate_token(&user, &other).unwrap();
        assert!(auth.verify_token(&foreign.access_token).is_err());
    }
}
