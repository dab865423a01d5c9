//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on repository and email traits,
//! never on concrete stores.

mod auth_service;
pub mod container;
mod email_service;
mod password_service;
mod registration_service;
mod user_service;

pub use container::{ServiceContainer, Services};

pub use auth_service::{AuthService, Authenticator, Claims, TokenResponse};
pub use email_service::{EmailService, TemplatedEmailer};
pub use password_service::{PasswordManager, PasswordService};
pub use registration_service::{RegistrationService, Registrar};
pub use user_service::{UserManager, UserService};

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
#[cfg(any(test, feature = "test-utils"))]
pub use email_service::MockEmailService;
