//! SMS delivery

use async_trait::async_trait;
use bhada_common::mask_phone;
use bhada_errors::AppResult;
use tracing::info;

use crate::domain::services::SmsSender;

/// Writes messages to the log. No SMS gateway is integrated yet.
#[derive(Debug, Clone, Default)]
pub struct LoggingSmsSender {
    log_body: bool,
}

impl LoggingSmsSender {
    pub fn new(log_body: bool) -> Self {
        Self { log_body }
    }
}

#[async_trait]
impl SmsSender for LoggingSmsSender {
    async fn send_sms(&self, phone: &str, message: &str) -> AppResult<()> {
        if self.log_body {
            info!(phone = %mask_phone(phone), message = %message, "SMS not sent (no gateway configured)");
        } else {
            info!(phone = %mask_phone(phone), "SMS not sent (no gateway configured)");
        }
        Ok(())
    }
}
