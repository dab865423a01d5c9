//! Domain layer - Core business entities and logic
//!
//! Entities and value objects with no knowledge of storage or transport.

pub mod password;
pub mod reset_token;
pub mod user;

pub use password::Password;
pub use reset_token::PasswordResetToken;
pub use user::{
    normalize_email, validate_email, validate_username, RegisterUser, UpdateUser, User,
    UserResponse, UserRole, UserStatus,
};
