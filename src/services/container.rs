//! Service container - Wires repositories and services together.

use std::sync::Arc;

use chrono::Duration;

use super::{
    AuthService, Authenticator, EmailService, PasswordManager, PasswordService, Registrar,
    RegistrationService, TemplatedEmailer, UserManager, UserService,
};
use crate::config::Config;
use crate::infra::{EmailQueue, InMemoryResetTokenStore, InMemoryUserStore};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Centralized access to application services.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn registration(&self) -> Arc<dyn RegistrationService>;

    fn auth(&self) -> Arc<dyn AuthService>;

    fn users(&self) -> Arc<dyn UserService>;

    fn passwords(&self) -> Arc<dyn PasswordService>;
}

pub struct Services {
    registration_service: Arc<dyn RegistrationService>,
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
    password_service: Arc<dyn PasswordService>,
}

impl Services {
    pub fn new(
        registration_service: Arc<dyn RegistrationService>,
        auth_service: Arc<dyn AuthService>,
        user_service: Arc<dyn UserService>,
        password_service: Arc<dyn PasswordService>,
    ) -> Self {
        Self {
            registration_service,
            auth_service,
            user_service,
            password_service,
        }
    }

    /// Build every service on top of fresh in-memory stores.
    ///
    /// Emails are rendered and pushed onto `queue`; whoever holds the
    /// receiving end delivers them.
    pub fn in_memory(config: &Config, queue: EmailQueue) -> Self {
        let users = Arc::new(InMemoryUserStore::new());
        let tokens = Arc::new(InMemoryResetTokenStore::new());
        let emails: Arc<dyn EmailService> = Arc::new(TemplatedEmailer::new(queue, config));

        Self {
            registration_service: Arc::new(Registrar::new(users.clone(), emails.clone())),
            auth_service: Arc::new(Authenticator::new(users.clone(), config.clone())),
            user_service: Arc::new(UserManager::new(
                users.clone(),
                tokens.clone(),
                emails.clone(),
            )),
            password_service: Arc::new(PasswordManager::new(
                users,
                tokens,
                emails,
                Duration::minutes(config.reset_token_ttl_minutes),
            )),
        }
    }
}

impl ServiceContainer for Services {
    fn registration(&self) -> Arc<dyn RegistrationService> {
        self.registration_service.clone()
    }

    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    fn passwords(&self) -> Arc<dyn PasswordService> {
        self.password_service.clone()
    }
}
