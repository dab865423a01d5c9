//! Application settings loaded from environment variables.

use std::env;
use std::str::FromStr;

use super::constants::{
    DEFAULT_APP_BASE_URL, DEFAULT_APP_NAME, DEFAULT_EMAIL_QUEUE_CAPACITY,
    DEFAULT_JWT_EXPIRATION_HOURS, DEFAULT_MAIL_FROM, DEFAULT_RESET_TOKEN_TTL_MINUTES,
    MIN_JWT_SECRET_LENGTH,
};
use crate::errors::{AppError, AppResult};

/// Credentials for the admin account created at startup.
#[derive(Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Product name and public URL used when rendering mail.
///
/// Needs no secrets, so template tooling can load it on its own.
#[derive(Debug, Clone)]
pub struct Branding {
    pub app_name: String,
    pub app_base_url: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            app_base_url: DEFAULT_APP_BASE_URL.to_string(),
        }
    }
}

impl Branding {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            app_name: env::var("APP_NAME").unwrap_or_else(|_| DEFAULT_APP_NAME.to_string()),
            app_base_url: env::var("APP_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_APP_BASE_URL.to_string()),
        }
    }
}

/// Application configuration
///
/// The listen address is not part of it: `serve` reads `SERVER_HOST` and
/// `SERVER_PORT` through its own flags.
#[derive(Clone)]
pub struct Config {
    jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub branding: Branding,
    pub mail_from: String,
    pub reset_token_ttl_minutes: i64,
    pub email_queue_capacity: usize,
    pub admin_seed: Option<AdminSeed>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("branding", &self.branding)
            .field("mail_from", &self.mail_from)
            .field("reset_token_ttl_minutes", &self.reset_token_ttl_minutes)
            .field("email_queue_capacity", &self.email_queue_capacity)
            .field("admin_seed", &self.admin_seed)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// Fails if JWT_SECRET is missing in a release build or is too short, or
    /// if a numeric setting does not parse or is not positive.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if cfg!(debug_assertions) => {
                tracing::warn!("JWT_SECRET not set, using insecure default for development");
                "dev-secret-key-minimum-32-chars!!".to_string()
            }
            Err(_) => {
                return Err(AppError::internal(
                    "JWT_SECRET environment variable must be set in production",
                ))
            }
        };

        let admin_seed = match (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(AdminSeed { email, password }),
            _ => None,
        };

        let mut config = Self::with_secret(jwt_secret)?;
        config.jwt_expiration_hours = env_or("JWT_EXPIRATION_HOURS", DEFAULT_JWT_EXPIRATION_HOURS)?;
        config.branding = Branding::from_env();
        config.mail_from = env::var("MAIL_FROM").unwrap_or_else(|_| DEFAULT_MAIL_FROM.to_string());
        config.reset_token_ttl_minutes =
            env_or("RESET_TOKEN_TTL_MINUTES", DEFAULT_RESET_TOKEN_TTL_MINUTES)?;
        config.email_queue_capacity = env_or("EMAIL_QUEUE_CAPACITY", DEFAULT_EMAIL_QUEUE_CAPACITY)?;
        config.admin_seed = admin_seed;

        config.validate()?;
        Ok(config)
    }

    /// Reject durations and capacities that would make the service useless.
    pub fn validate(&self) -> AppResult<()> {
        if self.jwt_expiration_hours <= 0 {
            return Err(invalid("JWT_EXPIRATION_HOURS", self.jwt_expiration_hours, "must be positive"));
        }
        if self.reset_token_ttl_minutes <= 0 {
            return Err(invalid(
                "RESET_TOKEN_TTL_MINUTES",
                self.reset_token_ttl_minutes,
                "must be positive",
            ));
        }
        if self.email_queue_capacity == 0 {
            return Err(invalid("EMAIL_QUEUE_CAPACITY", 0, "must be at least 1"));
        }
        Ok(())
    }

    /// Build a configuration with defaults for everything but the secret.
    pub fn with_secret(jwt_secret: impl Into<String>) -> AppResult<Self> {
        let jwt_secret = jwt_secret.into();
        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(AppError::internal(format!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            )));
        }

        Ok(Self {
            jwt_secret,
            jwt_expiration_hours: DEFAULT_JWT_EXPIRATION_HOURS,
            branding: Branding::default(),
            mail_from: DEFAULT_MAIL_FROM.to_string(),
            reset_token_ttl_minutes: DEFAULT_RESET_TOKEN_TTL_MINUTES,
            email_queue_capacity: DEFAULT_EMAIL_QUEUE_CAPACITY,
            admin_seed: None,
        })
    }

    /// Get JWT secret bytes for token signing/verification.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    parse_setting(key, env::var(key).ok(), default)
}

/// Parse a raw setting. Unset or blank falls back to `default`; anything
/// else must parse.
fn parse_setting<T: FromStr>(key: &str, raw: Option<String>, default: T) -> AppResult<T> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| invalid(key, value, "is not a valid number")),
    }
}

fn invalid(key: &str, value: impl std::fmt::Display, reason: &str) -> AppError {
    AppError::internal(format!("{}='{}' {}", key, value, reason))
}
