use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Database URL that selects the in-process user store instead of Postgres.
pub const MEMORY_DATABASE_URL: &str = "memory://";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub environment: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// Frontend base URL. Activation links point here and it is the CORS origin.
    pub client_url: String,
    /// Directory served as static files at the application root
    pub uploads_dir: String,
    pub request_timeout: u64,
    pub auth: AuthConfig,
    pub email: EmailConfig,
    pub image_host: ImageHostConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Session token lifetime in seconds
    pub jwt_expiration: i64,
    pub activation_secret: String,
    /// Activation token lifetime in seconds
    pub activation_expiry_secs: i64,
    pub cookie_expire_days: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_name: String,
    pub from_address: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageHostConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
    pub avatar_folder: String,
    pub avatar_width: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        if !environment.eq_ignore_ascii_case("production") {
            // Local overrides kept next to the service config
            dotenvy::from_path("config/.env").ok();
        }

        Ok(Config {
            environment,
            port: parse_or("PORT", 8000)?,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            max_connections: parse_or("MAX_CONNECTIONS", 10)?,
            client_url: env::var("CLIENT_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string()),
            request_timeout: parse_or("REQUEST_TIMEOUT", 30)?,
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET_KEY").map_err(|_| {
                    anyhow::anyhow!("JWT_SECRET_KEY environment variable is required")
                })?,
                jwt_expiration: parse_or("JWT_EXPIRES", 7 * 24 * 60 * 60)?,
                activation_secret: env::var("ACTIVATION_SECRET").map_err(|_| {
                    anyhow::anyhow!("ACTIVATION_SECRET environment variable is required")
                })?,
                activation_expiry_secs: parse_or("ACTIVATION_EXPIRES", 300)?,
                cookie_expire_days: parse_or("COOKIE_EXPIRE_DAYS", 90)?,
                bcrypt_cost: parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            },
            email: EmailConfig {
                smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
                smtp_port: parse_or("SMTP_PORT", 587)?,
                smtp_username: env::var("SMTP_MAIL").unwrap_or_default(),
                smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),
                from_name: env::var("EMAIL_FROM_NAME").unwrap_or_else(|_| "Shop".to_string()),
                from_address: env::var("EMAIL_FROM_ADDRESS")
                    .or_else(|_| env::var("SMTP_MAIL"))
                    .unwrap_or_else(|_| "noreply@localhost".to_string()),
                enabled: parse_or("EMAIL_ENABLED", true)?,
            },
            image_host: ImageHostConfig {
                cloud_name: env::var("CLOUDINARY_CLOUD_NAME").unwrap_or_default(),
                api_key: env::var("CLOUDINARY_API_KEY").unwrap_or_default(),
                api_secret: env::var("CLOUDINARY_API_SECRET").unwrap_or_default(),
                base_url: env::var("CLOUDINARY_BASE_URL")
                    .unwrap_or_else(|_| "https://api.cloudinary.com/v1_1".to_string()),
                avatar_folder: env::var("AVATAR_FOLDER").unwrap_or_else(|_| "avatars".to_string()),
                avatar_width: parse_or("AVATAR_WIDTH", 150)?,
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }
}

/// Local development defaults: in-memory store, mail disabled.
impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 8000,
            database_url: MEMORY_DATABASE_URL.to_string(),
            max_connections: 10,
            client_url: "http://localhost:3000".to_string(),
            uploads_dir: "uploads".to_string(),
            request_timeout: 30,
            auth: AuthConfig {
                jwt_secret: "development-jwt-secret".to_string(),
                jwt_expiration: 7 * 24 * 60 * 60,
                activation_secret: "development-activation-secret".to_string(),
                activation_expiry_secs: 300,
                cookie_expire_days: 90,
                bcrypt_cost: bcrypt::DEFAULT_COST,
            },
            email: EmailConfig {
                smtp_host: "localhost".to_string(),
                smtp_port: 1025,
                smtp_username: String::new(),
                smtp_password: String::new(),
                from_name: "Shop".to_string(),
                from_address: "noreply@localhost".to_string(),
                enabled: false,
            },
            image_host: ImageHostConfig {
                cloud_name: "demo".to_string(),
                api_key: String::new(),
                api_secret: String::new(),
                base_url: "https://api.cloudinary.com/v1_1".to_string(),
                avatar_folder: "avatars".to_string(),
                avatar_width: 150,
            },
        }
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", key, raw, e)),
        Err(_) => Ok(default),
    }
}
