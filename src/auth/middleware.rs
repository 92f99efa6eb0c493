use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::AppState;
use crate::auth::Role;
use crate::auth::cookie::token_from_headers;
use crate::auth::jwt::JwtError;
use crate::error::{ApiError, ErrorCode, Result};

/// Verified identity of the caller, placed in request extensions by
/// [`auth_middleware`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Session authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    let token = token_from_headers(request.headers())
        .ok_or_else(|| ApiError::Unauthorized("Please login to continue".to_string()))?;

    let claims = state.jwt_service.decode_token(&token).map_err(|e| {
        debug!(error = %e, "Rejected session token");
        match e {
            JwtError::Expired => ApiError::with_code(
                ErrorCode::TokenExpired,
                ErrorCode::TokenExpired.message(),
            ),
            _ => ApiError::with_code(ErrorCode::TokenInvalid, "Invalid or expired token"),
        }
    })?;

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: claims.sub,
    });
    Ok(next.run(request).await)
}

/// Role-based authorization middleware for admin access.
///
/// The role is read from the store, not the token, so a demotion takes
/// effect on the next request.
pub async fn require_admin_role(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    request: Request<Body>,
    next: Next,
) -> Result<Response> {
    let account = state
        .users
        .find_by_id(user.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Please login to continue".to_string()))?;

    if account.role == Role::Admin {
        Ok(next.run(request).await)
    } else {
        warn!(user_id = %user.user_id, role = %account.role, "Admin route refused");
        Err(ApiError::Forbidden(format!(
            "{} can not access this resource!",
            account.role
        )))
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or_else(|| ApiError::Unauthorized("Please login to continue".to_string()))
    }
}
