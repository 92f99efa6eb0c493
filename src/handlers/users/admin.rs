use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use super::{discard_avatar, load_user};
use crate::AppState;
use crate::error::{ApiError, Result};
use crate::handlers::extractors::ValidatedUuid;
use crate::handlers::response::{MessageResponse, UsersResponse};

/// All users, newest first (admin only)
#[utoipa::path(
    get,
    path = "/api/v2/user/admin-all-users",
    responses(
        (status = 200, description = "Every user", body = UsersResponse),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Admin role required")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn admin_all_users(State(state): State<AppState>) -> Result<Json<UsersResponse>> {
    let users = state.users.list_newest_first().await?;
    Ok(Json(UsersResponse::new(users)))
}

/// Delete a user and its avatar (admin only)
#[utoipa::path(
    delete,
    path = "/api/v2/user/delete-user/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let user_id = ValidatedUuid::parse(&id)?;
    let user = load_user(&state, user_id).await?;

    if !state.users.delete(user.id).await? {
        // Removed concurrently between lookup and delete
        return Err(ApiError::not_found("User"));
    }
    // The account is gone either way; a stray image is only logged
    discard_avatar(&state, &user.avatar.public_id).await;

    info!(user_id = %user.id, email = %user.email, "User deleted by admin");
    Ok(Json(MessageResponse::new("User deleted successfully!")))
}
