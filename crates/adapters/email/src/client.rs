//! SMTP client

use crate::{EmailConfig, EmailSender};
use bhada_common::mask_email;
use bhada_errors::{AppError, AppResult};
use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;
use std::time::Duration;
use tracing::{debug, info};

/// Outgoing message
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: Option<String>,
    pub text_body: String,
}

/// SMTP email client
pub struct EmailClient {
    config: EmailConfig,
}

impl EmailClient {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn build_transport(&self) -> AppResult<SmtpTransport> {
        let credentials = Credentials::new(
            self.config.username.clone(),
            self.config.password.expose_secret().clone(),
        );

        let transport = if self.config.use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
        } else {
            SmtpTransport::relay(&self.config.smtp_host)
        }
        .map_err(|e| AppError::internal(format!("Failed to create SMTP transport: {}", e)))?
        .port(self.config.smtp_port)
        .credentials(credentials)
        .timeout(Some(Duration::from_secs(self.config.timeout_secs)))
        .build();

        Ok(transport)
    }

    fn build_message(&self, msg: &EmailMessage) -> AppResult<Message> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| AppError::internal(format!("Invalid from address: {}", e)))?;

        let to = msg
            .to
            .parse()
            .map_err(|e| AppError::validation(format!("Invalid to address: {}", e)))?;

        let message_builder = Message::builder().from(from).to(to).subject(&msg.subject);

        let text_part = SinglePart::builder()
            .header(header::ContentType::TEXT_PLAIN)
            .body(msg.text_body.clone());

        let body = match &msg.html_body {
            Some(html) => MultiPart::alternative().singlepart(text_part).singlepart(
                SinglePart::builder()
                    .header(header::ContentType::TEXT_HTML)
                    .body(html.clone()),
            ),
            None => MultiPart::alternative().singlepart(text_part),
        };

        message_builder
            .multipart(body)
            .map_err(|e| AppError::internal(format!("Failed to build message: {}", e)))
    }

    async fn send_message(&self, message: Message) -> AppResult<()> {
        let transport = self.build_transport()?;

        // lettre's SmtpTransport is blocking
        tokio::task::spawn_blocking(move || {
            transport
                .send(&message)
                .map_err(|e| AppError::external_service(format!("Failed to send email: {}", e)))
        })
        .await
        .map_err(|e| AppError::internal(format!("Task join error: {}", e)))??;

        Ok(())
    }

    async fn deliver(&self, msg: EmailMessage) -> AppResult<()> {
        debug!(to = %mask_email(&msg.to), subject = %msg.subject, "Sending email");

        let message = self.build_message(&msg)?;
        self.send_message(message).await?;

        info!(to = %mask_email(&msg.to), subject = %msg.subject, "Email sent");
        Ok(())
    }
}

#[async_trait::async_trait]
impl EmailSender for EmailClient {
    async fn send_text_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        self.deliver(EmailMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            html_body: None,
            text_body: body.to_string(),
        })
        .await
    }

    async fn send_html_email(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: Option<&str>,
    ) -> AppResult<()> {
        self.deliver(EmailMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            html_body: Some(html_body.to_string()),
            text_body: text_body.unwrap_or_default().to_string(),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> EmailClient {
        EmailClient::new(EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            username: "user@example.com".to_string(),
            password: secrecy::Secret::new("password".to_string()),
            from_email: "noreply@bhada.in".to_string(),
            from_name: "Bhada".to_string(),
            use_tls: true,
            timeout_secs: 30,
            template_dir: None,
        })
    }

    #[test]
    fn test_build_message() {
        let msg = EmailMessage {
            to: "test@example.com".to_string(),
            subject: "Your Bhada verification code".to_string(),
            html_body: Some("<h1>123456</h1>".to_string()),
            text_body: "123456".to_string(),
        };

        assert!(client().build_message(&msg).is_ok());
    }

    #[test]
    fn test_invalid_recipient_is_validation_error() {
        let msg = EmailMessage {
            to: "not an address".to_string(),
            subject: "x".to_string(),
            html_body: None,
            text_body: "x".to_string(),
        };

        let err = client().build_message(&msg).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
