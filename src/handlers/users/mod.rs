//! User account routes mounted under `/api/v2/user`.

pub mod addresses;
pub mod admin;
pub mod profile;
pub mod registration;
pub mod routes;
pub mod session;
pub mod types;

pub use routes::user_routes;

use tracing::warn;
use uuid::Uuid;

use crate::AppState;
use crate::error::{ApiError, Result};
use crate::models::User;

/// Load a user that must exist.
async fn load_user(state: &AppState, user_id: Uuid) -> Result<User> {
    state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))
}

/// Check `password` against the stored hash of `user_id`.
async fn password_matches(state: &AppState, user_id: Uuid, password: &str) -> Result<bool> {
    if password.is_empty() {
        return Ok(false);
    }
    let hash = state
        .users
        .password_hash(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    state.passwords.verify_password(password, &hash)
}

/// Destroy an avatar that is no longer referenced. Failures are logged, not returned.
async fn discard_avatar(state: &AppState, public_id: &str) {
    if public_id.is_empty() {
        return;
    }
    if let Err(e) = state.images.destroy(public_id).await {
        warn!(public_id = %public_id, error = %e, "Failed to clean up avatar");
    }
}
