//! Route table for the user resource.

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};

use super::{
    addresses::{delete_user_address, update_user_addresses},
    admin::{admin_all_users, delete_user},
    profile::{update_avatar, update_user_info, update_user_password, user_info},
    registration::{activate_user, create_user},
    session::{get_user, login_user, logout},
};
use crate::AppState;
use crate::auth::middleware::{auth_middleware, require_admin_role};

/// Build the user routes. Guards are attached per group with `route_layer`
/// so unmatched paths still fall through to the static files.
pub fn user_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/create-user", post(create_user))
        .route("/activation", post(activate_user))
        .route("/login-user", post(login_user))
        .route("/logout", get(logout))
        .route("/user-info/{id}", get(user_info));

    let authenticated = Router::new()
        .route("/getuser", get(get_user))
        .route("/update-user-info", put(update_user_info))
        .route("/update-avatar", put(update_avatar))
        .route("/update-user-addresses", put(update_user_addresses))
        .route("/delete-user-address/{id}", delete(delete_user_address))
        .route("/update-user-password", put(update_user_password))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    // Layers run outermost-last: authentication first, then the role check
    let admin = Router::new()
        .route("/admin-all-users", get(admin_all_users))
        .route("/delete-user/{id}", delete(delete_user))
        .route_layer(from_fn_with_state(state.clone(), require_admin_role))
        .route_layer(from_fn_with_state(state, auth_middleware));

    public.merge(authenticated).merge(admin)
}
