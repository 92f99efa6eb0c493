use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};

use super::load_user;
use super::types::LoginRequest;
use crate::AppState;
use crate::auth::cookie::{expired_session_cookie, session_cookie, set_cookie_header};
use crate::auth::middleware::AuthenticatedUser;
use crate::error::{ApiError, Result};
use crate::handlers::extractors::AppJson;
use crate::handlers::response::{MessageResponse, SessionResponse, UserResponse};
use crate::models::User;

/// Sign a session token for `user`, set it as the `token` cookie and echo it in the body.
pub(super) fn issue_session(state: &AppState, user: User, status: StatusCode) -> Result<Response> {
    let token = state
        .jwt_service
        .encode_token(user.id)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let cookie = session_cookie(&token, state.config.auth.cookie_expire_days);

    Ok((
        status,
        [(SET_COOKIE, set_cookie_header(&cookie)?)],
        Json(SessionResponse {
            success: true,
            user,
            token,
        }),
    )
        .into_response())
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/v2/user/login-user",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = SessionResponse),
        (status = 400, description = "Missing fields, unknown account or invalid credentials")
    ),
    tag = "users"
)]
pub async fn login_user(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Response> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::missing_fields());
    }

    let user = state
        .users
        .find_by_email(&request.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %request.email, "Login for unknown account");
            ApiError::unknown_account()
        })?;

    let hash = state
        .users
        .password_hash(user.id)
        .await?
        .ok_or_else(ApiError::unknown_account)?;

    if !state.passwords.verify_password(&request.password, &hash)? {
        warn!(user_id = %user.id, "Login failed: invalid password");
        return Err(ApiError::invalid_credentials());
    }

    info!(user_id = %user.id, "User logged in");
    issue_session(&state, user, StatusCode::OK)
}

/// Current user behind the session
#[utoipa::path(
    get,
    path = "/api/v2/user/getuser",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "User no longer exists")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<UserResponse>> {
    let user = load_user(&state, auth.user_id).await?;
    Ok(Json(UserResponse::new(user)))
}

/// Clear the session cookie
#[utoipa::path(
    get,
    path = "/api/v2/user/logout",
    responses(
        (status = 200, description = "Session cookie cleared", body = MessageResponse)
    ),
    tag = "users"
)]
pub async fn logout() -> Result<Response> {
    let cleared = set_cookie_header(&expired_session_cookie())?;

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cleared)],
        Json(MessageResponse::new("Logged out successfully")),
    )
        .into_response())
}
