//! Email sign-in and credential commands
//!
//! Fields arrive as raw strings straight from request bodies; the handler
//! validates them.

use bhada_auth_core::TokenPair;
use bhada_common::UserId;
use bhada_cqrs_core::Command;
use serde::Deserialize;

use crate::application::dto::{AccountDto, AuthSession, MessageResult, OtpSent};
use crate::domain::account::AccountRole;
use crate::domain::otp::OtpPurpose;

fn registration() -> OtpPurpose {
    OtpPurpose::Registration
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendOtpCommand {
    pub email: String,
    #[serde(default = "registration")]
    pub purpose: OtpPurpose,
}

impl Command for SendOtpCommand {
    type Result = OtpSent;
}

/// Purpose is explicit so a forgot-password resend never issues a sign-up code
#[derive(Debug, Clone, Deserialize)]
pub struct ResendOtpCommand {
    pub email: String,
    #[serde(default = "registration")]
    pub purpose: OtpPurpose,
}

impl Command for ResendOtpCommand {
    type Result = OtpSent;
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyOtpCommand {
    pub email: String,
    #[serde(alias = "code")]
    pub otp: String,
}

impl Command for VerifyOtpCommand {
    type Result = AuthSession;
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterCommand {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub password: String,
    #[serde(alias = "code")]
    pub otp: String,
    #[serde(default)]
    pub role: AccountRole,
}

impl Command for RegisterCommand {
    type Result = AuthSession;
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

impl Command for LoginCommand {
    type Result = AuthSession;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenCommand {
    #[serde(alias = "refresh_token")]
    pub refresh_token: String,
}

impl Command for RefreshTokenCommand {
    type Result = TokenPair;
}

#[derive(Debug, Clone)]
pub struct SetPasswordCommand {
    pub user_id: UserId,
    pub password: String,
}

impl Command for SetPasswordCommand {
    type Result = AccountDto;
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordCommand {
    pub email: String,
}

impl Command for ForgotPasswordCommand {
    type Result = OtpSent;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordCommand {
    pub email: String,
    #[serde(alias = "code")]
    pub otp: String,
    #[serde(alias = "new_password")]
    pub new_password: String,
}

impl Command for ResetPasswordCommand {
    type Result = MessageResult;
}
