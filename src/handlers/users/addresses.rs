use axum::{
    extract::{Path, State},
    Json,
};
use tracing::debug;

use crate::AppState;
use crate::auth::middleware::AuthenticatedUser;
use crate::error::{ApiError, Result};
use crate::handlers::extractors::AppJson;
use crate::handlers::response::UserResponse;
use crate::models::Address;

/// Insert an address, or update the one with the same id
#[utoipa::path(
    put,
    path = "/api/v2/user/update-user-addresses",
    request_body = Address,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 401, description = "Not logged in")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_user_addresses(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    AppJson(mut address): AppJson<Address>,
) -> Result<Json<UserResponse>> {
    address.ensure_id();

    let user = state
        .users
        .upsert_address(auth.user_id, &address)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    debug!(user_id = %user.id, address_id = %address.id, "Address upserted");

    Ok(Json(UserResponse::new(user)))
}

/// Remove an address by id. Unknown ids leave the list as it is.
#[utoipa::path(
    delete,
    path = "/api/v2/user/delete-user-address/{id}",
    params(("id" = String, Path, description = "Address id")),
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 401, description = "Not logged in")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    tag = "users"
)]
pub async fn delete_user_address(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(address_id): Path<String>,
) -> Result<Json<UserResponse>> {
    let user = state
        .users
        .pull_address(auth.user_id, &address_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(Json(UserResponse::new(user)))
}
