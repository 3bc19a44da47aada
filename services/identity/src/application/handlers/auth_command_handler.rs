//! Auth command handler

use std::sync::Arc;

use async_trait::async_trait;
use bhada_auth_core::TokenPair;
use bhada_cqrs_core::CommandHandler;
use tracing::debug;

use crate::application::commands::*;
use crate::application::dto::{AccountDto, AuthSession, MessageResult, OtpSent};
use crate::application::services::AuthService;
use crate::domain::otp::OtpPurpose;
use crate::domain::value_objects::{Email, Phone};
use crate::error::AuthError;

pub struct AuthCommandHandler {
    auth: Arc<AuthService>,
}

impl AuthCommandHandler {
    pub fn new(auth: Arc<AuthService>) -> Self {
        Self { auth }
    }
}

fn code_sent(purpose: OtpPurpose) -> &'static str {
    match purpose {
        OtpPurpose::Registration => "Verification code sent to your email",
        OtpPurpose::ForgotPassword => "Password reset code sent to your email",
        OtpPurpose::PhoneVerification => "Verification code sent to your phone",
    }
}

#[async_trait]
impl CommandHandler<SendOtpCommand> for AuthCommandHandler {
    type Error = AuthError;

    async fn handle(&self, command: SendOtpCommand) -> Result<OtpSent, AuthError> {
        debug!(purpose = %command.purpose, "Handling SendOtpCommand");
        let email = Email::new(command.email)?;
        let issued = self.auth.send_otp(&email, command.purpose).await?;
        Ok(OtpSent::new(code_sent(command.purpose), issued))
    }
}

#[async_trait]
impl CommandHandler<ResendOtpCommand> for AuthCommandHandler {
    type Error = AuthError;

    async fn handle(&self, command: ResendOtpCommand) -> Result<OtpSent, AuthError> {
        debug!(purpose = %command.purpose, "Handling ResendOtpCommand");
        let email = Email::new(command.email)?;
        let issued = self.auth.resend_otp(&email, command.purpose).await?;
        Ok(OtpSent::new(code_sent(command.purpose), issued))
    }
}

#[async_trait]
impl CommandHandler<VerifyOtpCommand> for AuthCommandHandler {
    type Error = AuthError;

    async fn handle(&self, command: VerifyOtpCommand) -> Result<AuthSession, AuthError> {
        let email = Email::new(command.email)?;
        self.auth.verify_otp(&email, &command.otp).await
    }
}

#[async_trait]
impl CommandHandler<RegisterCommand> for AuthCommandHandler {
    type Error = AuthError;

    async fn handle(&self, command: RegisterCommand) -> Result<AuthSession, AuthError> {
        let email = Email::new(command.email)?;
        self.auth
            .register(
                &email,
                command.name,
                &command.password,
                &command.otp,
                command.role,
            )
            .await
    }
}

#[async_trait]
impl CommandHandler<LoginCommand> for AuthCommandHandler {
    type Error = AuthError;

    async fn handle(&self, command: LoginCommand) -> Result<AuthSession, AuthError> {
        // A malformed address can never match an account
        let email = Email::new(command.email).map_err(|_| AuthError::InvalidCredentials)?;
        self.auth.login(&email, &command.password).await
    }
}

#[async_trait]
impl CommandHandler<RefreshTokenCommand> for AuthCommandHandler {
    type Error = AuthError;

    async fn handle(&self, command: RefreshTokenCommand) -> Result<TokenPair, AuthError> {
        self.auth.refresh(&command.refresh_token).await
    }
}

#[async_trait]
impl CommandHandler<SetPasswordCommand> for AuthCommandHandler {
    type Error = AuthError;

    async fn handle(&self, command: SetPasswordCommand) -> Result<AccountDto, AuthError> {
        let account = self
            .auth
            .set_password(&command.user_id, &command.password)
            .await?;
        Ok(AccountDto::from(account))
    }
}

#[async_trait]
impl CommandHandler<ForgotPasswordCommand> for AuthCommandHandler {
    type Error = AuthError;

    async fn handle(&self, command: ForgotPasswordCommand) -> Result<OtpSent, AuthError> {
        let email = Email::new(command.email)?;
        let issued = self
            .auth
            .send_otp(&email, OtpPurpose::ForgotPassword)
            .await?;
        Ok(OtpSent::new(code_sent(OtpPurpose::ForgotPassword), issued))
    }
}

#[async_trait]
impl CommandHandler<ResetPasswordCommand> for AuthCommandHandler {
    type Error = AuthError;

    async fn handle(&self, command: ResetPasswordCommand) -> Result<MessageResult, AuthError> {
        let email = Email::new(command.email)?;
        self.auth
            .reset_password(&email, &command.otp, &command.new_password)
            .await?;
        Ok(MessageResult::new("Password has been reset. You can now sign in"))
    }
}

#[async_trait]
impl CommandHandler<SendPhoneOtpCommand> for AuthCommandHandler {
    type Error = AuthError;

    async fn handle(&self, command: SendPhoneOtpCommand) -> Result<OtpSent, AuthError> {
        let phone = Phone::new(command.phone)?;
        let issued = self.auth.send_phone_code(&command.user_id, &phone).await?;
        Ok(OtpSent::new(
            code_sent(OtpPurpose::PhoneVerification),
            issued,
        ))
    }
}

#[async_trait]
impl CommandHandler<VerifyPhoneCommand> for AuthCommandHandler {
    type Error = AuthError;

    async fn handle(&self, command: VerifyPhoneCommand) -> Result<AccountDto, AuthError> {
        let phone = Phone::new(command.phone)?;
        let account = self
            .auth
            .verify_phone(&command.user_id, &phone, &command.otp)
            .await?;
        Ok(AccountDto::from(account))
    }
}
