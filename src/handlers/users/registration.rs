//! Stateless registration: nothing is persisted until the mailed
//! activation token comes back.

use axum::{extract::State, http::StatusCode, response::Response, Json};
use tracing::{info, warn};
use validator::Validate;

use super::discard_avatar;
use super::session::issue_session;
use super::types::{ActivationRequest, CreateUserRequest};
use crate::AppState;
use crate::auth::jwt::{JwtError, PendingRegistration};
use crate::error::{ApiError, Result};
use crate::handlers::extractors::AppJson;
use crate::handlers::response::{MessageResponse, SessionResponse};
use crate::models::{Avatar, NewUser};
use crate::services::{MailMessage, UploadOptions};

/// Register: upload the avatar and mail an activation link
#[utoipa::path(
    post,
    path = "/api/v2/user/create-user",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Activation email sent", body = MessageResponse),
        (status = 400, description = "User already exists or invalid input"),
        (status = 502, description = "Image host or mail delivery failed")
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    request.validate()?;

    if state.users.find_by_email(&request.email).await?.is_some() {
        info!(email = %request.email, "Registration refused, email taken");
        return Err(ApiError::already_exists("User"));
    }

    let password_hash = state.passwords.hash_password(&request.password)?;

    let options = UploadOptions {
        folder: state.config.image_host.avatar_folder.clone(),
        width: None,
    };
    let avatar: Avatar = state.images.upload(&request.avatar, &options).await?.into();

    let pending = PendingRegistration {
        name: request.name,
        email: request.email.clone(),
        password_hash,
        avatar: avatar.clone(),
    };

    if let Err(e) = send_activation(&state, pending).await {
        // The account will never be created; drop its avatar
        discard_avatar(&state, &avatar.public_id).await;
        return Err(e);
    }

    info!(email = %request.email, "Registration started, activation email sent");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(format!(
            "Please check {} to activate your account!",
            request.email
        ))),
    ))
}

async fn send_activation(state: &AppState, pending: PendingRegistration) -> Result<()> {
    let email = pending.email.clone();
    let name = pending.name.clone();

    let token = state
        .activation
        .sign(pending)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let activation_url = format!(
        "{}/activation/{}",
        state.config.client_url.trim_end_matches('/'),
        token
    );

    state
        .mailer
        .send(MailMessage::activation(&email, &name, &activation_url)?)
        .await?;
    Ok(())
}

/// Activate: persist the pending registration and start a session
#[utoipa::path(
    post,
    path = "/api/v2/user/activation",
    request_body = ActivationRequest,
    responses(
        (status = 201, description = "Account created and session issued", body = SessionResponse),
        (status = 400, description = "Token expired or invalid, or user already exists")
    ),
    tag = "users"
)]
pub async fn activate_user(
    State(state): State<AppState>,
    AppJson(request): AppJson<ActivationRequest>,
) -> Result<Response> {
    let pending = state
        .activation
        .verify(&request.activation_token)
        .map_err(|e| {
            warn!(error = %e, "Activation token rejected");
            match e {
                JwtError::Expired => ApiError::activation_expired(),
                _ => ApiError::activation_invalid(),
            }
        })?;

    if state.users.find_by_email(&pending.email).await?.is_some() {
        return Err(ApiError::already_exists("User"));
    }

    let user = state
        .users
        .create(NewUser {
            name: pending.name,
            email: pending.email,
            password_hash: pending.password_hash,
            avatar: pending.avatar,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "User activated");
    issue_session(&state, user, StatusCode::CREATED)
}
