//! Delivery ports

use async_trait::async_trait;
use bhada_errors::AppResult;

use crate::domain::otp::{Identifier, OtpCode, OtpPurpose};

/// Gets a freshly issued code to its owner over the identifier's channel
#[async_trait]
pub trait OtpNotifier: Send + Sync {
    async fn deliver(
        &self,
        identifier: &Identifier,
        code: &OtpCode,
        purpose: OtpPurpose,
        expires_in_minutes: i64,
    ) -> AppResult<()>;
}

#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send_sms(&self, phone: &str, message: &str) -> AppResult<()>;
}
