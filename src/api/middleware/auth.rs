//! JWT authentication middleware.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::config::BEARER_TOKEN_PREFIX;
use crate::domain::{User, UserRole};
use crate::errors::AppError;

/// Authenticated user, loaded fresh from the store on every request.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// JWT authentication middleware.
///
/// A valid signature is not enough: the account must still exist and be
/// active, so deleting or suspending a user cuts off tokens already issued.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_TOKEN_PREFIX))
        .ok_or(AppError::Unauthorized)?;

    let claims = state.auth_service.verify_token(token)?;

    let user = match state.user_service.get_user(claims.sub).await {
        Ok(user) => user,
        Err(AppError::NotFound) => return Err(AppError::Unauthorized),
        Err(e) => return Err(e),
    };
    if !user.is_active() {
        return Err(AppError::AccountDisabled(user.status.to_string()));
    }

    request.extensions_mut().insert(CurrentUser::from(&user));

    Ok(next.run(request).await)
}

/// Require admin role, returns Forbidden error if not admin.
pub fn require_admin(user: &CurrentUser) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Allow access to one's own record, or to any record for admins.
pub fn require_self_or_admin(user: &CurrentUser, id: Uuid) -> Result<(), AppError> {
    if user.id == id {
        Ok(())
    } else {
        require_admin(user)
    }
}
