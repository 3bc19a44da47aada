//! Auth response DTOs

use bhada_auth_core::TokenPair;
use serde::{Deserialize, Serialize};

use super::AccountDto;
use crate::domain::auth_flow::{AuthStep, EmailCheck};
use crate::domain::services::IssuedCode;

/// Answer to "which step comes after this email?"
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailCheckResult {
    pub exists: bool,
    pub has_password: bool,
    pub next_step: AuthStep,
}

impl From<EmailCheck> for EmailCheckResult {
    fn from(check: EmailCheck) -> Self {
        Self {
            exists: check.exists,
            has_password: check.has_password,
            next_step: check.next_step(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpSent {
    pub message: String,
    #[serde(flatten)]
    pub code: IssuedCode,
}

impl OtpSent {
    pub fn new(message: impl Into<String>, code: IssuedCode) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

/// Signed-in session handed back by every successful sign-in path
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user: AccountDto,
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub is_new_user: bool,
    /// Coins credited to a brand-new account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub welcome_bonus: Option<i64>,
    pub needs_password_setup: bool,
    /// `None` once fully signed in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<AuthStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResult {
    pub message: String,
}

impl MessageResult {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
