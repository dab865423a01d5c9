//! Application state shared by every handler.

use std::sync::Arc;

use crate::infra::EmailQueue;
use crate::services::{
    AuthService, PasswordService, RegistrationService, ServiceContainer, UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub registration_service: Arc<dyn RegistrationService>,
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pub password_service: Arc<dyn PasswordService>,
    /// Kept for health reporting on the outbound email pipeline.
    pub email_queue: EmailQueue,
}

impl AppState {
    pub fn new(services: &dyn ServiceContainer, email_queue: EmailQueue) -> Self {
        Self {
            registration_service: services.registration(),
            auth_service: services.auth(),
            user_service: services.users(),
            password_service: services.passwords(),
            email_queue,
        }
    }
}
