use utoipa::openapi::security::{
    ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme,
};
use utoipa::OpenApi;

use crate::handlers::{response, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "User API",
        version = "0.1.0",
        description = "User accounts for the storefront: registration, sessions, profiles and admin",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        // Registration
        users::registration::create_user,
        users::registration::activate_user,

        // Session
        users::session::login_user,
        users::session::get_user,
        users::session::logout,

        // Profile
        users::profile::update_user_info,
        users::profile::update_avatar,
        users::profile::update_user_password,
        users::profile::user_info,

        // Addresses
        users::addresses::update_user_addresses,
        users::addresses::delete_user_address,

        // Admin
        users::admin::admin_all_users,
        users::admin::delete_user,
    ),
    components(schemas(
        crate::models::User,
        crate::models::Address,
        crate::models::Avatar,
        crate::auth::Role,
        response::UserResponse,
        response::UsersResponse,
        response::MessageResponse,
        response::SessionResponse,
        users::types::CreateUserRequest,
        users::types::ActivationRequest,
        users::types::LoginRequest,
        users::types::UpdateUserInfoRequest,
        users::types::UpdateAvatarRequest,
        users::types::UpdatePasswordRequest,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "users", description = "Registration, session and profile"),
        (name = "admin", description = "User administration (Admin role)"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("token"))),
            );
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Session token, as issued in the `token` cookie"))
                        .build(),
                ),
            );
        }
    }
}
