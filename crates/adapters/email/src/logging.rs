//! Log-only sender

use bhada_common::mask_email;
use bhada_errors::AppResult;
use tracing::info;

use crate::EmailSender;

/// Writes deliveries to the log instead of sending them.
///
/// Used when no `[email]` section is configured. In development builds the
/// body is logged too, so codes can be read from the console.
#[derive(Debug, Clone, Default)]
pub struct LoggingEmailSender {
    log_body: bool,
}

impl LoggingEmailSender {
    pub fn new(log_body: bool) -> Self {
        Self { log_body }
    }
}

#[async_trait::async_trait]
impl EmailSender for LoggingEmailSender {
    async fn send_text_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        if self.log_body {
            info!(to = %mask_email(to), subject = %subject, body = %body, "Email not sent (no SMTP configured)");
        } else {
            info!(to = %mask_email(to), subject = %subject, "Email not sent (no SMTP configured)");
        }
        Ok(())
    }

    async fn send_html_email(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: Option<&str>,
    ) -> AppResult<()> {
        self.send_text_email(to, subject, text_body.unwrap_or(html_body))
            .await
    }
}
