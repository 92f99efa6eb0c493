pub mod templates;

use anyhow::{Context, Result};
use askama::Template;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;
use tracing::{error, info};

use crate::config::EmailConfig;
use templates::{ActivationEmailHtml, ActivationEmailText};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid mailbox '{0}'")]
    Address(String),

    #[error("failed to build email message: {0}")]
    Build(String),

    #[error("SMTP delivery failed: {0}")]
    Transport(String),

    #[error("failed to render email template: {0}")]
    Template(#[from] askama::Error),
}

/// A rendered email with plain text and HTML alternatives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl MailMessage {
    /// Account activation mail carrying the activation link
    pub fn activation(
        to: &str,
        name: &str,
        activation_url: &str,
    ) -> std::result::Result<Self, MailError> {
        Ok(Self {
            to: to.to_string(),
            subject: "Activate your account".to_string(),
            text: ActivationEmailText {
                name,
                activation_url,
            }
            .render()?,
            html: ActivationEmailHtml {
                name,
                activation_url,
            }
            .render()?,
        })
    }
}

/// Outbound mail delivery
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> std::result::Result<(), MailError>;
}

/// SMTP mailer for transactional emails
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
    from_name: String,
    enabled: bool,
}

impl EmailService {
    /// Create a new email service from configuration
    pub fn new(config: &EmailConfig) -> Result<Self> {
        // Port 1025 is MailHog/local testing (no TLS)
        let use_tls = config.smtp_port != 1025;

        let mailer = if use_tls {
            let creds =
                Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .context("Failed to create SMTP transport with TLS")?
                .port(config.smtp_port)
                .credentials(creds)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
                .port(config.smtp_port)
                .build()
        };

        info!(
            "Email service initialized: {}:{} (TLS: {}, enabled: {})",
            config.smtp_host, config.smtp_port, use_tls, config.enabled
        );

        Ok(Self {
            mailer,
            from_email: config.from_address.clone(),
            from_name: config.from_name.clone(),
            enabled: config.enabled,
        })
    }

    /// Check if email service is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn build_message(&self, message: &MailMessage) -> std::result::Result<Message, MailError> {
        let from_raw = format!("{} <{}>", self.from_name, self.from_email);
        let from: Mailbox = from_raw.parse().map_err(|_| MailError::Address(from_raw))?;

        let to: Mailbox = message
            .to
            .parse()
            .map_err(|_| MailError::Address(message.to.clone()))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(message.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.html.clone()),
                    ),
            )
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl Mailer for EmailService {
    async fn send(&self, message: MailMessage) -> std::result::Result<(), MailError> {
        // Built even when disabled so bad recipients still fail the request
        let email = self.build_message(&message)?;

        if !self.enabled {
            info!(
                to = %message.to,
                subject = %message.subject,
                "Email service disabled, skipping delivery"
            );
            return Ok(());
        }

        match self.mailer.send(email).await {
            Ok(_) => {
                info!(to = %message.to, subject = %message.subject, "Email sent");
                Ok(())
            }
            Err(e) => {
                error!("Failed to send email to {}: {}", message.to, e);
                Err(MailError::Transport(e.to_string()))
            }
        }
    }
}
