//! Application startup and initialization logic

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::config::Config;
use crate::database::{self, InMemoryUserStore, PgUserStore, UserStore};
use crate::services::{CloudinaryClient, EmailService};

/// Initialize application services and create the AppState.
pub async fn initialize_app(config: &Config) -> Result<AppState> {
    info!("🚀 Starting user service ({})", config.environment);

    let users: Arc<dyn UserStore> = if config.uses_memory_store() {
        if config.is_production() {
            anyhow::bail!("DATABASE_URL={} is not allowed in production", config.database_url);
        }
        warn!("Using in-memory user store; accounts are lost on restart");
        Arc::new(InMemoryUserStore::new())
    } else {
        let db_pool = database::setup_database(&config.database_url, config.max_connections).await?;
        info!("✅ PostgreSQL connection established");

        database::run_migrations(&db_pool).await?;
        info!("✅ Database migrations completed");

        Arc::new(PgUserStore::new(db_pool))
    };

    let images = CloudinaryClient::new(&config.image_host)?;
    info!("✅ Image host client initialized");

    let mailer = EmailService::new(&config.email)?;
    if !mailer.is_enabled() {
        warn!("Email delivery disabled; activation emails will not be delivered");
    }
    info!("✅ Email service initialized");

    let state = AppState::new(config.clone(), users, Arc::new(images), Arc::new(mailer));
    info!("✅ Auth services initialized");

    Ok(state)
}
