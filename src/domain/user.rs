//! User domain entity and related types.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::ValidateEmail;

use crate::config::{
    MAX_USERNAME_LENGTH, MIN_USERNAME_LENGTH, ROLE_ADMIN, ROLE_USER, STATUS_ACTIVE,
    STATUS_INACTIVE, STATUS_SUSPENDED,
};
use crate::errors::{AppError, AppResult};

static USERNAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("username pattern is valid"));

/// User roles enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl From<&str> for UserRole {
    fn from(s: &str) -> Self {
        match s {
            ROLE_ADMIN => UserRole::Admin,
            _ => UserRole::User,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "{}", ROLE_ADMIN),
            UserRole::User => write!(f, "{}", ROLE_USER),
        }
    }
}

/// Account status. Only active accounts may sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

impl UserStatus {
    pub fn can_login(&self) -> bool {
        matches!(self, UserStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => STATUS_ACTIVE,
            UserStatus::Inactive => STATUS_INACTIVE,
            UserStatus::Suspended => STATUS_SUSPENDED,
        }
    }
}

impl std::str::FromStr for UserStatus {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            STATUS_ACTIVE => Ok(UserStatus::Active),
            STATUS_INACTIVE => Ok(UserStatus::Inactive),
            STATUS_SUSPENDED => Ok(UserStatus::Suspended),
            other => Err(AppError::validation(format!(
                "Invalid status '{}'. Must be one of: active, inactive, suspended",
                other
            ))),
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check an email address after normalization.
pub fn validate_email(email: &str) -> AppResult<()> {
    let email = normalize_email(email);
    if !email.is_empty() && email.validate_email() {
        Ok(())
    } else {
        Err(AppError::validation("Invalid email format"))
    }
}

/// Usernames: 3 to 32 characters of letters, digits, `_`, `.` or `-`.
pub fn validate_username(username: &str) -> AppResult<()> {
    let length = username.chars().count() as u64;
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&length) {
        return Err(AppError::validation(format!(
            "Username must be between {} and {} characters",
            MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH
        )));
    }
    if !USERNAME_CHARS.is_match(username) {
        return Err(AppError::validation(
            "Username may only contain letters, digits, '_', '.' and '-'",
        ));
    }
    Ok(())
}

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Create a new active user with default role
    pub fn new(username: String, email: &str, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email: normalize_email(email),
            password_hash,
            role: UserRole::User,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_active(&self) -> bool {
        self.status.can_login()
    }

    pub fn set_username(&mut self, username: String) {
        self.username = username;
        self.touch();
    }

    pub fn set_email(&mut self, email: &str) {
        self.email = normalize_email(email);
        self.touch();
    }

    pub fn set_role(&mut self, role: UserRole) {
        self.role = role;
        self.touch();
    }

    pub fn set_status(&mut self, status: UserStatus) {
        self.status = status;
        self.touch();
    }

    pub fn set_password_hash(&mut self, password_hash: String) {
        self.password_hash = password_hash;
        self.touch();
    }

    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// User registration data
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterUser {
    #[schema(example = "jdoe")]
    pub username: String,
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "SecurePass123!", min_length = 8)]
    pub password: String,
}

/// Partial user update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateUser {
    #[schema(example = "jane")]
    pub username: Option<String>,
    #[schema(example = "jane@example.com")]
    pub email: Option<String>,
    /// New role (admin only)
    #[schema(example = "admin")]
    pub role: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.role.is_none()
    }
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(example = "jdoe")]
    pub username: String,
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "user")]
    pub role: String,
    #[schema(example = "active")]
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role.to_string(),
            status: user.status,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}
