//! Request bodies for the user routes.

use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

// ============================================================================
// Registration
// ============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Data URI or remote URL of the profile picture
    #[validate(length(min = 1, message = "Avatar is required"))]
    pub avatar: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ActivationRequest {
    #[serde(default)]
    pub activation_token: String,
}

// ============================================================================
// Session
// ============================================================================

/// Fields default to empty so a missing field is reported as such, not as a parse error
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

// ============================================================================
// Profile
// ============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInfoRequest {
    /// Current password, required to confirm the change
    #[serde(default)]
    pub password: String,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Name can not be empty"))]
    pub name: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAvatarRequest {
    /// Empty keeps the current avatar
    #[serde(default)]
    pub avatar: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_request_validation() {
        let valid = CreateUserRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "secret".into(),
            avatar: "data:image/png;base64,AAAA".into(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = CreateUserRequest {
            email: "not-an-email".into(),
            ..valid
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_update_info_accepts_partial_body() {
        let request: UpdateUserInfoRequest = serde_json::from_value(serde_json::json!({
            "password": "secret",
            "phoneNumber": "555-0100"
        }))
        .unwrap();

        assert!(request.validate().is_ok());
        assert!(request.email.is_none());
        assert_eq!(request.phone_number.as_deref(), Some("555-0100"));
    }

    #[test]
    fn test_update_info_rejects_empty_name() {
        let request = UpdateUserInfoRequest {
            password: "secret".into(),
            email: None,
            name: Some(String::new()),
            phone_number: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_password_request_uses_camel_case() {
        let request: UpdatePasswordRequest = serde_json::from_value(serde_json::json!({
            "oldPassword": "a",
            "newPassword": "b",
            "confirmPassword": "b"
        }))
        .unwrap();

        assert_eq!(request.old_password, "a");
        assert_eq!(request.confirm_password, "b");
    }
}
