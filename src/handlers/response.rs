//! Response envelopes for the user routes.
//!
//! Every success body carries `success: true` next to its payload.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::User;

/// `{ success, user }`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
}

impl UserResponse {
    pub fn new(user: User) -> Self {
        Self {
            success: true,
            user,
        }
    }
}

/// `{ success, users }`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<User>,
}

impl UsersResponse {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            success: true,
            users,
        }
    }
}

/// `{ success, message }`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Session issued on login and activation. The token is also set as the `token` cookie.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub success: bool,
    pub user: User,
    pub token: String,
}
