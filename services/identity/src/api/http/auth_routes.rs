//! `/api/auth` routes

use axum::{Json, extract::State, http::StatusCode};
use bhada_auth_core::TokenPair;
use bhada_cqrs_core::{CommandHandler, QueryHandler};
use serde::Deserialize;

use super::{AppState, AuthUser, ValidJson};
use crate::application::commands::*;
use crate::application::dto::{AccountDto, AuthSession, EmailCheckResult, MessageResult, OtpSent};
use crate::application::queries::{CheckEmailQuery, GetAccountQuery};
use crate::error::AuthError;

type ApiResult<T> = Result<Json<T>, AuthError>;

pub async fn check_email(
    State(state): State<AppState>,
    ValidJson(query): ValidJson<CheckEmailQuery>,
) -> ApiResult<EmailCheckResult> {
    Ok(Json(state.accounts.handle(query).await?))
}

pub async fn send_otp(
    State(state): State<AppState>,
    ValidJson(command): ValidJson<SendOtpCommand>,
) -> ApiResult<OtpSent> {
    Ok(Json(state.commands.handle(command).await?))
}

pub async fn resend_otp(
    State(state): State<AppState>,
    ValidJson(command): ValidJson<ResendOtpCommand>,
) -> ApiResult<OtpSent> {
    Ok(Json(state.commands.handle(command).await?))
}

pub async fn verify_otp(
    State(state): State<AppState>,
    ValidJson(command): ValidJson<VerifyOtpCommand>,
) -> ApiResult<AuthSession> {
    Ok(Json(state.commands.handle(command).await?))
}

pub async fn register(
    State(state): State<AppState>,
    ValidJson(command): ValidJson<RegisterCommand>,
) -> Result<(StatusCode, Json<AuthSession>), AuthError> {
    let session = state.commands.handle(command).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn login(
    State(state): State<AppState>,
    ValidJson(command): ValidJson<LoginCommand>,
) -> ApiResult<AuthSession> {
    Ok(Json(state.commands.handle(command).await?))
}

pub async fn refresh(
    State(state): State<AppState>,
    ValidJson(command): ValidJson<RefreshTokenCommand>,
) -> ApiResult<TokenPair> {
    Ok(Json(state.commands.handle(command).await?))
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub password: String,
}

pub async fn set_password(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(body): ValidJson<SetPasswordRequest>,
) -> ApiResult<AccountDto> {
    let command = SetPasswordCommand {
        user_id: user.user_id,
        password: body.password,
    };
    Ok(Json(state.commands.handle(command).await?))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    ValidJson(command): ValidJson<ForgotPasswordCommand>,
) -> ApiResult<OtpSent> {
    Ok(Json(state.commands.handle(command).await?))
}

pub async fn reset_password(
    State(state): State<AppState>,
    ValidJson(command): ValidJson<ResetPasswordCommand>,
) -> ApiResult<MessageResult> {
    Ok(Json(state.commands.handle(command).await?))
}

#[derive(Debug, Deserialize)]
pub struct PhoneRequest {
    pub phone: String,
}

pub async fn send_phone_otp(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(body): ValidJson<PhoneRequest>,
) -> ApiResult<OtpSent> {
    let command = SendPhoneOtpCommand {
        user_id: user.user_id,
        phone: body.phone,
    };
    Ok(Json(state.commands.handle(command).await?))
}

#[derive(Debug, Deserialize)]
pub struct VerifyPhoneRequest {
    pub phone: String,
    #[serde(alias = "code")]
    pub otp: String,
}

pub async fn verify_phone(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(body): ValidJson<VerifyPhoneRequest>,
) -> ApiResult<AccountDto> {
    let command = VerifyPhoneCommand {
        user_id: user.user_id,
        phone: body.phone,
        otp: body.otp,
    };
    Ok(Json(state.commands.handle(command).await?))
}

pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<AccountDto> {
    let query = GetAccountQuery {
        user_id: user.user_id,
    };
    Ok(Json(state.accounts.handle(query).await?))
}
