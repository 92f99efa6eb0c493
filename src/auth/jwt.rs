//! Token issuance and verification.
//!
//! Two independent HS256 keys are in play: the session key signs the token
//! carried in the `token` cookie, the activation key signs the pending
//! registration mailed to a new user.

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{Claims, TOKEN_ISSUER};
use crate::models::user::Avatar;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Invalid(err.to_string()),
        }
    }
}

/// Signs and verifies session tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiration_secs: i64,
}

impl JwtService {
    pub fn new(secret: &str, expiration_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiration_secs,
        }
    }

    pub fn encode_token(&self, user_id: Uuid) -> Result<String, JwtError> {
        let claims = Claims::new(user_id, self.expiration_secs);
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Signing(e.to_string()))
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims, JwtError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

/// A registration that has not been activated yet. It lives only inside
/// the activation token; nothing is persisted until activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRegistration {
    pub name: String,
    pub email: String,
    /// bcrypt hash; the plaintext password never leaves the registration handler
    pub password_hash: String,
    pub avatar: Avatar,
}

#[derive(Debug, Serialize, Deserialize)]
struct ActivationClaims {
    user: PendingRegistration,
    iat: i64,
    exp: i64,
}

/// Signs pending registrations into short-lived activation tokens
#[derive(Clone)]
pub struct ActivationTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry_secs: i64,
}

impl ActivationTokenService {
    pub fn new(secret: &str, expiry_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Lifetimes are minutes long; no clock skew allowance
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry_secs,
        }
    }

    pub fn sign(&self, pending: PendingRegistration) -> Result<String, JwtError> {
        let now = Utc::now().timestamp();
        let claims = ActivationClaims {
            user: pending,
            iat: now,
            exp: now + self.expiry_secs,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<PendingRegistration, JwtError> {
        let data = decode::<ActivationClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims.user)
    }
}
