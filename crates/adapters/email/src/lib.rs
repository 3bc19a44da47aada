//! Email adapter
//!
//! - SMTP delivery through lettre
//! - tera templates
//! - a log-only sender for environments without SMTP

mod client;
mod logging;
mod template;

pub use bhada_config::EmailConfig;
pub use client::{EmailClient, EmailMessage};
pub use logging::LoggingEmailSender;
pub use template::EmailTemplate;

use bhada_errors::AppResult;

/// Outbound email port
#[async_trait::async_trait]
pub trait EmailSender: Send + Sync {
    /// Send a plain-text email
    async fn send_text_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()>;

    /// Send an HTML email with an optional plain-text alternative
    async fn send_html_email(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: Option<&str>,
    ) -> AppResult<()>;
}
