//! Routes codes to email or SMS

use std::sync::Arc;

use async_trait::async_trait;
use bhada_adapter_email::{EmailSender, EmailTemplate};
use bhada_errors::AppResult;
use serde_json::json;

use crate::domain::otp::{Identifier, OtpCode, OtpPurpose};
use crate::domain::services::{OtpNotifier, SmsSender};

const TEMPLATE: &str = "otp";

pub struct ChannelOtpNotifier {
    email: Arc<dyn EmailSender>,
    sms: Arc<dyn SmsSender>,
    templates: Option<Arc<EmailTemplate>>,
    app_name: String,
}

impl ChannelOtpNotifier {
    pub fn new(
        email: Arc<dyn EmailSender>,
        sms: Arc<dyn SmsSender>,
        app_name: impl Into<String>,
    ) -> Self {
        Self {
            email,
            sms,
            templates: None,
            app_name: app_name.into(),
        }
    }

    /// Render HTML mail from `otp.html` / `otp.txt` instead of the built-in text
    pub fn with_templates(mut self, templates: Arc<EmailTemplate>) -> Self {
        self.templates = Some(templates);
        self
    }

    fn subject(&self, purpose: OtpPurpose) -> String {
        match purpose {
            OtpPurpose::Registration => format!("Your {} sign-in code", self.app_name),
            OtpPurpose::ForgotPassword => format!("Reset your {} password", self.app_name),
            OtpPurpose::PhoneVerification => format!("Verify your phone for {}", self.app_name),
        }
    }

    fn text_body(&self, code: &OtpCode, purpose: OtpPurpose, expires_in_minutes: i64) -> String {
        let action = match purpose {
            OtpPurpose::Registration => "sign in",
            OtpPurpose::ForgotPassword => "reset your password",
            OtpPurpose::PhoneVerification => "verify your phone",
        };
        format!(
            "Use {} to {} on {}. The code expires in {} minutes. \
             If you did not ask for it, ignore this message.",
            code.as_str(),
            action,
            self.app_name,
            expires_in_minutes
        )
    }
}

#[async_trait]
impl OtpNotifier for ChannelOtpNotifier {
    async fn deliver(
        &self,
        identifier: &Identifier,
        code: &OtpCode,
        purpose: OtpPurpose,
        expires_in_minutes: i64,
    ) -> AppResult<()> {
        match identifier {
            Identifier::Phone(phone) => {
                self.sms
                    .send_sms(phone.as_str(), &self.text_body(code, purpose, expires_in_minutes))
                    .await
            }
            Identifier::Email(email) => {
                let subject = self.subject(purpose);

                match &self.templates {
                    Some(templates) if templates.has_template("otp.html") => {
                        let context = json!({
                            "app_name": self.app_name,
                            "code": code.as_str(),
                            "purpose": purpose.as_str(),
                            "expires_in_minutes": expires_in_minutes,
                        });
                        let (html, text) = templates.render_pair(TEMPLATE, &context)?;
                        self.email
                            .send_html_email(email.as_str(), &subject, &html, Some(&text))
                            .await
                    }
                    _ => {
                        self.email
                            .send_text_email(
                                email.as_str(),
                                &subject,
                                &self.text_body(code, purpose, expires_in_minutes),
                            )
                            .await
                    }
                }
            }
        }
    }
}
