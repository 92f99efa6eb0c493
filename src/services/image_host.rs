//! Avatar storage on a Cloudinary-compatible image host.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ImageHostConfig;
use crate::models::Avatar;

#[derive(Debug, Error)]
pub enum ImageHostError {
    #[error("request to image host failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("image host rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Where and how an image is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub folder: String,
    /// Resize to this width on upload
    pub width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedImage {
    pub public_id: String,
    pub secure_url: String,
}

impl From<UploadedImage> for Avatar {
    fn from(image: UploadedImage) -> Self {
        Avatar {
            public_id: image.public_id,
            url: image.secure_url,
        }
    }
}

/// Remote image storage used for avatars
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Upload `file`, a data URI or a remote URL
    async fn upload(
        &self,
        file: &str,
        options: &UploadOptions,
    ) -> std::result::Result<UploadedImage, ImageHostError>;

    async fn destroy(&self, public_id: &str) -> std::result::Result<(), ImageHostError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

/// Signed REST client for the Cloudinary upload API
#[derive(Clone)]
pub struct CloudinaryClient {
    client: Client,
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl CloudinaryClient {
    pub fn new(config: &ImageHostConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(20))
            .build()?;

        if config.api_secret.is_empty() {
            warn!("CLOUDINARY_API_SECRET is not set; image uploads will be rejected");
        }

        info!(
            "Image host client initialized: {}/{}",
            config.base_url, config.cloud_name
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/{}/image/{}", self.base_url, self.cloud_name, action)
    }

    /// Adds `timestamp`, `api_key` and the request signature to `params`.
    fn signed_form(&self, mut params: BTreeMap<&'static str, String>) -> BTreeMap<&'static str, String> {
        params.insert("timestamp", chrono::Utc::now().timestamp().to_string());
        let signature = sign_params(&params, &self.api_secret);

        params.insert("signature", signature);
        params.insert("signature_algorithm", "sha256".to_string());
        params.insert("api_key", self.api_key.clone());
        params
    }

    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        action: &str,
        form: &BTreeMap<&'static str, String>,
    ) -> std::result::Result<T, ImageHostError> {
        let response = self.client.post(self.endpoint(action)).form(form).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(ImageHostError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

/// SHA-256 signature over the sorted `key=value` pairs followed by the API secret.
pub fn sign_params(params: &BTreeMap<&'static str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ImageHost for CloudinaryClient {
    async fn upload(
        &self,
        file: &str,
        options: &UploadOptions,
    ) -> std::result::Result<UploadedImage, ImageHostError> {
        let mut params = BTreeMap::new();
        params.insert("folder", options.folder.clone());
        if let Some(width) = options.width {
            params.insert("transformation", format!("w_{}", width));
        }

        let mut form = self.signed_form(params);
        // The payload is never part of the signature
        form.insert("file", file.to_string());

        let uploaded: UploadedImage = self.post_form("upload", &form).await?;
        debug!(public_id = %uploaded.public_id, "Image uploaded");
        Ok(uploaded)
    }

    async fn destroy(&self, public_id: &str) -> std::result::Result<(), ImageHostError> {
        let mut params = BTreeMap::new();
        params.insert("public_id", public_id.to_string());

        let form = self.signed_form(params);
        let response: DestroyResponse = self.post_form("destroy", &form).await?;

        if response.result != "ok" {
            // Already gone counts as destroyed
            warn!(public_id = %public_id, result = %response.result, "Image destroy was a no-op");
        }
        Ok(())
    }
}
