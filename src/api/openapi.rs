//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{auth_handler, user_handler};
use crate::api::routes;
use crate::domain::{UserResponse, UserRole, UserStatus};
use crate::services::TokenResponse;
use crate::types::{MessageResponse, PaginationMeta, UserPage};

/// OpenAPI documentation for the User Registry
#[derive(OpenApi)]
#[openapi(
    info(
        title = "User Registry",
        version = "0.1.0",
        description = "User management API: registration, login, password reset and admin operations",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        routes::health,
        auth_handler::register,
        auth_handler::login,
        auth_handler::forgot_password,
        auth_handler::reset_password,
        user_handler::get_current_user,
        user_handler::change_password,
        user_handler::list_users,
        user_handler::lookup_user,
        user_handler::get_user,
        user_handler::update_user,
        user_handler::update_status,
        user_handler::delete_user,
    ),
    components(
        schemas(
            UserRole,
            UserStatus,
            UserResponse,
            UserPage,
            PaginationMeta,
            MessageResponse,
            TokenResponse,
            routes::HealthResponse,
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            auth_handler::ForgotPasswordRequest,
            auth_handler::ResetPasswordRequest,
            user_handler::UpdateUserRequest,
            user_handler::UpdateStatusRequest,
            user_handler::ChangePasswordRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service status"),
        (name = "Authentication", description = "Registration, login and password reset"),
        (name = "Users", description = "User management operations")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT token obtained from /auth/login"))
                        .build(),
                ),
            );
        }
    }
}
