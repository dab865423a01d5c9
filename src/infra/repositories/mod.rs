//! Repository layer - Data access abstraction
//!
//! Services only see the traits; the in-memory stores are the one
//! implementation shipped.

mod reset_token_repository;
mod user_repository;

pub use reset_token_repository::{InMemoryResetTokenStore, ResetTokenRepository};
pub use user_repository::{InMemoryUserStore, UserChange, UserRepository};

#[cfg(test)]
pub(crate) use user_repository::modify_copy_of;

#[cfg(any(test, feature = "test-utils"))]
pub use reset_token_repository::MockResetTokenRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
