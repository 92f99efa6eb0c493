// Outbound collaborators
// Mail delivery and avatar image hosting.

pub mod email;
pub mod image_host;

pub use email::{EmailService, MailError, MailMessage, Mailer};
pub use image_host::{CloudinaryClient, ImageHost, ImageHostError, UploadOptions, UploadedImage};
