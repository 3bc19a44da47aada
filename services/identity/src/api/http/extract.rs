//! Request extractors

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts},
};
use bhada_common::UserId;
use serde::de::DeserializeOwned;

use super::AppState;
use crate::error::AuthError;

/// Caller identified by a valid `Bearer` access token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
    pub role: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or(AuthError::InvalidToken)?;

        let claims = state
            .tokens
            .validate_access_token(token.trim())
            .map_err(|_| AuthError::InvalidToken)?;
        let user_id = claims.user_id().map_err(|_| AuthError::InvalidToken)?;

        Ok(Self {
            user_id,
            role: claims.role,
        })
    }
}

/// `Json` whose rejection is a problem document like every other error
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AuthError::Validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}
