//! Application state shared across all handlers.
//!
//! Collaborators are trait objects so the route table can be exercised with
//! in-process stand-ins.

use std::sync::Arc;

use crate::auth::jwt::{ActivationTokenService, JwtService};
use crate::auth::password::PasswordService;
use crate::config::Config;
use crate::database::UserStore;
use crate::services::{ImageHost, Mailer};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// User persistence (Postgres or in-memory)
    pub users: Arc<dyn UserStore>,
    /// Avatar image host
    pub images: Arc<dyn ImageHost>,
    /// Outbound mail delivery
    pub mailer: Arc<dyn Mailer>,
    /// Session token service
    pub jwt_service: JwtService,
    /// Activation token service for pending registrations
    pub activation: ActivationTokenService,
    /// bcrypt hashing
    pub passwords: PasswordService,
}

impl AppState {
    /// Assemble state from configuration and already-built collaborators.
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        images: Arc<dyn ImageHost>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let jwt_service = JwtService::new(&config.auth.jwt_secret, config.auth.jwt_expiration);
        let activation = ActivationTokenService::new(
            &config.auth.activation_secret,
            config.auth.activation_expiry_secs,
        );
        let passwords = PasswordService::new(config.auth.bcrypt_cost);

        Self {
            config,
            users,
            images,
            mailer,
            jwt_service,
            activation,
            passwords,
        }
    }
}
