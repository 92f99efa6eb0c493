//! Email templates for account notifications.
//!
//! HTML templates are auto-escaped by Askama; the plain text ones are not.

use askama::Template;

/// HTML template for the account activation email.
#[derive(Template)]
#[template(path = "email/activation.html")]
pub struct ActivationEmailHtml<'a> {
    pub name: &'a str,
    pub activation_url: &'a str,
}

/// Plain text template for the account activation email.
#[derive(Template)]
#[template(path = "email/activation.txt")]
pub struct ActivationEmailText<'a> {
    pub name: &'a str,
    pub activation_url: &'a str,
}
