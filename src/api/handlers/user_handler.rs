//! User handlers.

use axum::{
    extract::{Extension, State},
    response::Json,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::{ApiPath, ApiQuery, ValidatedJson};
use crate::api::middleware::{require_admin, require_self_or_admin, CurrentUser};
use crate::api::AppState;
use crate::domain::{UpdateUser, UserResponse, UserStatus};
use crate::errors::{AppError, AppResult};
use crate::types::{MessageResponse, NoContent, Paginated, PaginationParams, UserPage};

/// User update request with validation
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 32, message = "Username must be between 3 and 32 characters"))]
    #[schema(example = "jane")]
    pub username: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "jane@example.com")]
    pub email: Option<String>,
    /// New role (admin only)
    #[schema(example = "admin")]
    pub role: Option<String>,
}

impl From<UpdateUserRequest> for UpdateUser {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
            role: req.role,
        }
    }
}

/// Account status change
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusRequest {
    /// One of `active`, `inactive`, `suspended`
    #[schema(example = "suspended")]
    pub status: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(min_length = 8)]
    pub new_password: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmailQuery {
    /// Email address to look up
    pub email: String,
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/lookup", get(lookup_user))
        .route("/me", get(get_current_user))
        .route("/me/password", put(change_password))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/:id/status", put(update_status))
}

/// Get current authenticated user
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_current_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.get_user(current_user.id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Change own password
#[utoipa::path(
    put,
    path = "/users/me/password",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Current password is wrong")
    )
)]
pub async fn change_password(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .password_service
        .change_password(
            current_user.id,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    Ok(Json(MessageResponse::new("Password changed")))
}

/// List users (admin only)
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(PaginationParams),
    responses(
        (status = 200, description = "One page of users", body = UserPage),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_users(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PaginationParams>,
) -> AppResult<Json<Paginated<UserResponse>>> {
    require_admin(&current_user)?;
    let page = state.user_service.list_users(&params).await?;
    Ok(Json(page.map(UserResponse::from)))
}

/// Find a user by email (admin only)
#[utoipa::path(
    get,
    path = "/users/lookup",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(EmailQuery),
    responses(
        (status = 200, description = "Matching user", body = UserResponse),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "User not found")
    )
)]
pub async fn lookup_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<EmailQuery>,
) -> AppResult<Json<UserResponse>> {
    require_admin(&current_user)?;
    let user = state.user_service.get_user_by_email(&query.email).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Get user by ID (own profile or admin)
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Can only view own profile unless admin"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<UserResponse>> {
    require_self_or_admin(&current_user, id)?;
    let user = state.user_service.get_user(id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Update user (own profile or admin; role changes are admin only)
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Can only update own profile unless admin"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn update_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    require_self_or_admin(&current_user, id)?;
    if payload.role.is_some() {
        require_admin(&current_user)?;
    }

    let user = state.user_service.update_user(id, payload.into()).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Activate, deactivate or suspend a user (admin only, not self)
#[utoipa::path(
    put,
    path = "/users/{id}/status",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = UserResponse),
        (status = 400, description = "Unknown status or own account"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_status(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateStatusRequest>,
) -> AppResult<Json<UserResponse>> {
    require_admin(&current_user)?;
    if current_user.id == id {
        return Err(AppError::BadRequest(
            "Cannot change the status of your own account".to_string(),
        ));
    }

    let status: UserStatus = payload.status.parse()?;
    let user = state.user_service.set_status(id, status).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Delete user (admin only, cannot delete self)
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted successfully"),
        (status = 400, description = "Cannot delete your own account"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<NoContent> {
    require_admin(&current_user)?;
    if current_user.id == id {
        return Err(AppError::BadRequest(
            "Cannot delete your own account".to_string(),
        ));
    }

    state.user_service.delete_user(id).await?;
    Ok(NoContent)
}
