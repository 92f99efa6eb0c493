//! Common extractors for API handlers.

use axum::extract::FromRequest;
use uuid::Uuid;

use crate::error::ApiError;

/// JSON body extractor whose rejections render as [`ApiError`] bodies.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Validated UUID helper
///
/// Use this to parse and validate UUIDs from string path parameters.
///
/// # Example
/// ```ignore
/// let uuid = ValidatedUuid::parse(&id_string)?;
/// ```
pub struct ValidatedUuid;

impl ValidatedUuid {
    /// Parse a string into a UUID, returning an ApiError on failure
    pub fn parse(s: &str) -> Result<Uuid, ApiError> {
        Uuid::parse_str(s).map_err(|_| ApiError::validation_error(format!("Invalid id: {}", s)))
    }
}
