use async_trait::async_trait;
use bhada_common::UserId;
use bhada_errors::AppResult;

use crate::domain::wallet::CoinTransaction;

/// Append-only coin ledger
#[async_trait]
pub trait WalletRepository: Send + Sync {
    async fn append(&self, transaction: &CoinTransaction) -> AppResult<()>;

    /// Newest first
    async fn list_by_user(&self, user_id: &UserId) -> AppResult<Vec<CoinTransaction>>;
}
