use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;
use validator::Validate;

use super::types::{UpdateAvatarRequest, UpdatePasswordRequest, UpdateUserInfoRequest};
use super::{load_user, password_matches};
use crate::AppState;
use crate::auth::middleware::AuthenticatedUser;
use crate::error::{ApiError, ErrorCode, Result};
use crate::handlers::extractors::{AppJson, ValidatedUuid};
use crate::handlers::response::{MessageResponse, UserResponse};
use crate::models::{Avatar, ProfileChanges};
use crate::services::UploadOptions;

/// Update name, email and phone after re-checking the password
#[utoipa::path(
    put,
    path = "/api/v2/user/update-user-info",
    request_body = UpdateUserInfoRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid password, invalid input or email taken"),
        (status = 401, description = "Not logged in")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_user_info(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    AppJson(request): AppJson<UpdateUserInfoRequest>,
) -> Result<Json<UserResponse>> {
    request.validate()?;

    let user = load_user(&state, auth.user_id).await?;

    if !password_matches(&state, user.id, &request.password).await? {
        return Err(ApiError::with_code(
            ErrorCode::InvalidCredentials,
            "Invalid password",
        ));
    }

    if let Some(email) = request.email.as_deref() {
        if email != user.email {
            if let Some(owner) = state.users.find_by_email(email).await? {
                if owner.id != user.id {
                    return Err(ApiError::already_exists("User"));
                }
            }
        }
    }

    let changes = ProfileChanges {
        name: request.name,
        email: request.email,
        phone_number: request.phone_number,
    };
    let user = state.users.update_profile(user.id, changes).await?;
    info!(user_id = %user.id, "Profile updated");
    Ok(Json(UserResponse::new(user)))
}

/// Replace the avatar; an empty value keeps the current one
#[utoipa::path(
    put,
    path = "/api/v2/user/update-avatar",
    request_body = UpdateAvatarRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 401, description = "Not logged in"),
        (status = 502, description = "Image host failed")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_avatar(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    AppJson(request): AppJson<UpdateAvatarRequest>,
) -> Result<Json<UserResponse>> {
    let user = load_user(&state, auth.user_id).await?;
    if request.avatar.is_empty() {
        return Ok(Json(UserResponse::new(user)));
    }

    if !user.avatar.public_id.is_empty() {
        state.images.destroy(&user.avatar.public_id).await?;
    }

    let options = UploadOptions {
        folder: state.config.image_host.avatar_folder.clone(),
        width: Some(state.config.image_host.avatar_width),
    };
    let avatar: Avatar = state.images.upload(&request.avatar, &options).await?.into();
    info!(user_id = %user.id, public_id = %avatar.public_id, "Avatar replaced");

    let user = state.users.update_avatar(user.id, &avatar).await?;
    Ok(Json(UserResponse::new(user)))
}

/// Change password after checking the old one
#[utoipa::path(
    put,
    path = "/api/v2/user/update-user-password",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Old password incorrect or confirmation mismatch"),
        (status = 401, description = "Not logged in")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_user_password(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    AppJson(request): AppJson<UpdatePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    if !password_matches(&state, auth.user_id, &request.old_password).await? {
        return Err(ApiError::with_code(
            ErrorCode::InvalidCredentials,
            "Old password is incorrect!",
        ));
    }
    if request.new_password != request.confirm_password {
        return Err(ApiError::password_mismatch());
    }
    if request.new_password.is_empty() {
        return Err(ApiError::validation_error("New password is required"));
    }

    let hash = state.passwords.hash_password(&request.new_password)?;
    state.users.update_password(auth.user_id, &hash).await?;

    info!(user_id = %auth.user_id, "Password updated");
    Ok(Json(MessageResponse::new("Password updated successfully!")))
}

/// Public profile by id
#[utoipa::path(
    get,
    path = "/api/v2/user/user-info/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn user_info(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>> {
    let user_id = ValidatedUuid::parse(&id)?;
    let user = load_user(&state, user_id).await?;
    Ok(Json(UserResponse::new(user)))
}
