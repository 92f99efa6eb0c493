#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use user_api::auth::Role;
use user_api::config::Config;
use user_api::database::{InMemoryUserStore, UserStore};
use user_api::services::{
    ImageHost, ImageHostError, MailError, MailMessage, Mailer, UploadOptions, UploadedImage,
};
use user_api::{build_router, AppState};

/// Image host that records calls instead of talking to the network.
#[derive(Default)]
pub struct FakeImageHost {
    pub uploads: Mutex<Vec<(String, UploadOptions)>>,
    pub destroyed: Mutex<Vec<String>>,
    /// Makes every `destroy` call fail after recording it
    pub fail_destroy: AtomicBool,
    counter: AtomicUsize,
}

#[async_trait]
impl ImageHost for FakeImageHost {
    async fn upload(
        &self,
        file: &str,
        options: &UploadOptions,
    ) -> Result<UploadedImage, ImageHostError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.uploads
            .lock()
            .unwrap()
            .push((file.to_string(), options.clone()));

        let public_id = format!("{}/fake-{}", options.folder, n);
        Ok(UploadedImage {
            secure_url: format!("https://images.test/{}.png", public_id),
            public_id,
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<(), ImageHostError> {
        self.destroyed.lock().unwrap().push(public_id.to_string());
        if self.fail_destroy.load(Ordering::SeqCst) {
            return Err(ImageHostError::Rejected {
                status: 500,
                message: "storage unavailable".to_string(),
            });
        }
        Ok(())
    }
}

/// Mailer that keeps every message, or fails every send.
#[derive(Default)]
pub struct FakeMailer {
    pub sent: Mutex<Vec<MailMessage>>,
    pub fail: bool,
}

impl FakeMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Token from the most recent activation link.
    pub fn last_activation_token(&self) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let text = &sent.last()?.text;
        let start = text.find("/activation/")? + "/activation/".len();
        Some(
            text[start..]
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string(),
        )
    }
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Transport("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub users: Arc<InMemoryUserStore>,
    pub images: Arc<FakeImageHost>,
    pub mailer: Arc<FakeMailer>,
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.bcrypt_cost = 4;
    config.client_url = "http://shop.test".to_string();
    config
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(test_config(), FakeMailer::default())
    }

    pub fn with(config: Config, mailer: FakeMailer) -> Self {
        let users = Arc::new(InMemoryUserStore::new());
        let images = Arc::new(FakeImageHost::default());
        let mailer = Arc::new(mailer);

        let state = AppState::new(config, users.clone(), images.clone(), mailer.clone());
        let router = build_router(state.clone());

        Self {
            router,
            state,
            users,
            images,
            mailer,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Result<Response> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("token={}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };

        Ok(self.router.clone().oneshot(request).await?)
    }

    /// Register and activate, returning the session token and user id.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<(String, String)> {
        let response = self
            .send(
                Method::POST,
                "/api/v2/user/create-user",
                Some(serde_json::json!({
                    "name": name,
                    "email": email,
                    "password": password,
                    "avatar": "data:image/png;base64,iVBORw0KGgo="
                })),
                None,
            )
            .await?;
        if response.status() != StatusCode::CREATED {
            return Err(anyhow!("registration failed: {}", response.status()));
        }

        let activation_token = self
            .mailer
            .last_activation_token()
            .ok_or_else(|| anyhow!("no activation email sent"))?;

        let response = self
            .send(
                Method::POST,
                "/api/v2/user/activation",
                Some(serde_json::json!({ "activation_token": activation_token })),
                None,
            )
            .await?;
        if response.status() != StatusCode::CREATED {
            return Err(anyhow!("activation failed: {}", response.status()));
        }

        let body = body_json(response).await?;
        let token = body["token"].as_str().unwrap_or_default().to_string();
        let id = body["user"]["id"].as_str().unwrap_or_default().to_string();
        Ok((token, id))
    }

    /// Register, then promote the account to Admin directly in the store.
    pub async fn register_admin(&self, email: &str) -> Result<(String, String)> {
        let (token, id) = self.register("Admin", email, "admin-pass").await?;
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| anyhow!("admin not stored"))?;
        self.users.set_role(user.id, Role::Admin).await?;
        Ok((token, id))
    }
}

pub async fn body_json(response: Response) -> Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Value of the `token` cookie set by the response, if any.
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("token="))
        .map(str::to_string)
}
