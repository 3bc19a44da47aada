//! Service errors
//!
//! Every variant has a stable `code()` that clients branch on instead of
//! matching message text.

use axum::response::{IntoResponse, Response};
use bhada_errors::{AppError, ProblemDetails};
use thiserror::Error;

use crate::domain::auth_flow::AuthFlowError;
use crate::domain::otp::{IdentifierError, OtpError, Throttled};
use crate::domain::value_objects::{EmailError, PasswordError, PhoneError};
use crate::domain::wallet::WalletError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("This account has no password yet. Sign in with a verification code instead")]
    EmailVerificationRequired,

    #[error("Invalid or expired OTP")]
    InvalidOtp,

    #[error("Please wait {retry_after_secs} seconds before requesting another code")]
    OtpCooldown { retry_after_secs: i64 },

    #[error("Too many codes requested. Please try again later")]
    OtpRateLimited { retry_after_secs: i64 },

    #[error("An account with this email already exists")]
    AccountExists,

    #[error("Account not found")]
    AccountNotFound,

    #[error("{0}")]
    WeakPassword(String),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Could not deliver the verification code")]
    DeliveryFailed(#[source] AppError),

    #[error(transparent)]
    Infra(#[from] AppError),
}

pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::EmailVerificationRequired => "email_verification_required",
            Self::InvalidOtp => "invalid_otp",
            Self::OtpCooldown { .. } => "otp_cooldown",
            Self::OtpRateLimited { .. } => "otp_rate_limited",
            Self::AccountExists => "account_exists",
            Self::AccountNotFound => "account_not_found",
            Self::WeakPassword(_) => "weak_password",
            Self::Validation(_) => "validation",
            Self::InvalidToken => "invalid_token",
            Self::DeliveryFailed(_) => "delivery_failed",
            Self::Infra(e) => e.code(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidCredentials | Self::InvalidToken => 401,
            Self::EmailVerificationRequired => 403,
            Self::InvalidOtp | Self::WeakPassword(_) | Self::Validation(_) => 400,
            Self::OtpCooldown { .. } | Self::OtpRateLimited { .. } => 429,
            Self::AccountExists => 409,
            Self::AccountNotFound => 404,
            Self::DeliveryFailed(_) => 502,
            Self::Infra(e) => e.status_code(),
        }
    }

    pub fn retry_after_secs(&self) -> Option<i64> {
        match self {
            Self::OtpCooldown { retry_after_secs } | Self::OtpRateLimited { retry_after_secs } => {
                Some(*retry_after_secs)
            }
            _ => None,
        }
    }

    pub fn to_problem_details(&self) -> ProblemDetails {
        if let Self::Infra(e) = self {
            return e.to_problem_details();
        }

        let title = match self.status_code() {
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            409 => "Conflict",
            429 => "Too Many Requests",
            _ => "Bad Gateway",
        };

        let problem = ProblemDetails::new(self.status_code(), self.code(), title, self.to_string());
        match self.retry_after_secs() {
            Some(secs) => problem.with_retry_after(secs),
            None => problem,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if self.status_code() >= 500 {
            tracing::error!(code = self.code(), error = ?self, "Request failed");
        }
        self.to_problem_details().into_response()
    }
}

impl From<OtpError> for AuthError {
    fn from(_: OtpError) -> Self {
        Self::InvalidOtp
    }
}

impl From<Throttled> for AuthError {
    fn from(throttled: Throttled) -> Self {
        match throttled {
            Throttled::Cooldown { retry_after_secs } => Self::OtpCooldown { retry_after_secs },
            Throttled::RateLimited { retry_after_secs } => Self::OtpRateLimited { retry_after_secs },
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        if err.is_policy_violation() {
            Self::WeakPassword(err.to_string())
        } else {
            Self::Infra(AppError::internal(err.to_string()))
        }
    }
}

impl From<EmailError> for AuthError {
    fn from(err: EmailError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<PhoneError> for AuthError {
    fn from(err: PhoneError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<IdentifierError> for AuthError {
    fn from(err: IdentifierError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<WalletError> for AuthError {
    fn from(err: WalletError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<AuthFlowError> for AuthError {
    fn from(err: AuthFlowError) -> Self {
        Self::Infra(AppError::failed_precondition(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_statuses() {
        assert_eq!(AuthError::InvalidOtp.code(), "invalid_otp");
        assert_eq!(AuthError::InvalidOtp.status_code(), 400);
        assert_eq!(AuthError::EmailVerificationRequired.status_code(), 403);
        assert_eq!(AuthError::AccountExists.status_code(), 409);
        assert_eq!(
            AuthError::Infra(AppError::not_found("x")).code(),
            "not_found"
        );
    }

    #[test]
    fn test_every_otp_failure_is_the_same_error() {
        for err in [
            OtpError::Expired,
            OtpError::AlreadyUsed,
            OtpError::CodeMismatch,
            OtpError::TooManyAttempts,
        ] {
            let auth: AuthError = err.into();
            assert_eq!(auth.to_string(), "Invalid or expired OTP");
        }
    }

    #[test]
    fn test_cooldown_problem_carries_retry_after() {
        let problem = AuthError::OtpCooldown { retry_after_secs: 42 }.to_problem_details();
        assert_eq!(problem.status, 429);
        assert_eq!(problem.code, "otp_cooldown");
        assert_eq!(problem.retry_after_secs, Some(42));
    }

    #[test]
    fn test_weak_password_vs_hash_failure() {
        assert_eq!(AuthError::from(PasswordError::TooShort(8)).code(), "weak_password");
        assert_eq!(
            AuthError::from(PasswordError::HashingFailed("boom".into())).code(),
            "internal"
        );
    }

    #[test]
    fn test_infra_details_hidden() {
        let problem = AuthError::Infra(AppError::database("password=hunter2")).to_problem_details();
        assert!(!problem.detail.contains("hunter2"));
    }
}
