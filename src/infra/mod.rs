//! Infrastructure layer - Storage and outbound integrations
//!
//! - In-memory repositories behind repository traits
//! - Outbound email (queue + mailer)

pub mod mailer;
pub mod repositories;

pub use mailer::{EmailQueue, LogMailer, Mailer};
pub use repositories::{
    InMemoryResetTokenStore, InMemoryUserStore, ResetTokenRepository, UserChange, UserRepository,
};

#[cfg(test)]
pub(crate) use repositories::modify_copy_of;

#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{MockResetTokenRepository, MockUserRepository};
