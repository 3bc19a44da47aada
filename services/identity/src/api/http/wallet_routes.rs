use axum::{Json, extract::State};
use bhada_cqrs_core::QueryHandler;

use super::{AppState, AuthUser};
use crate::application::queries::GetWalletQuery;
use crate::domain::services::WalletSummary;
use crate::error::AuthError;

pub async fn summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<WalletSummary>, AuthError> {
    let query = GetWalletQuery {
        user_id: user.user_id,
    };
    Ok(Json(state.wallet.handle(query).await?))
}
