//! Coin wallet service

use std::sync::Arc;

use bhada_common::UserId;
use bhada_errors::{AppError, AppResult};
use metrics::counter;
use serde::Serialize;
use tracing::info;

use crate::domain::repositories::WalletRepository;
use crate::domain::wallet::{CoinReason, CoinTransaction, TransactionKind, compute_balance};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSummary {
    pub balance: i64,
    /// Newest first
    pub transactions: Vec<CoinTransaction>,
}

pub struct WalletService {
    repo: Arc<dyn WalletRepository>,
}

impl WalletService {
    pub fn new(repo: Arc<dyn WalletRepository>) -> Self {
        Self { repo }
    }

    /// Append a credit to the user's ledger
    pub async fn award(
        &self,
        user_id: &UserId,
        amount: i64,
        reason: CoinReason,
    ) -> AppResult<CoinTransaction> {
        let transaction = CoinTransaction::credit(user_id.clone(), amount, reason)
            .map_err(|e| AppError::validation(e.to_string()))?;

        self.repo.append(&transaction).await?;

        counter!("wallet_credits_total", "reason" => reason.as_str()).increment(1);
        info!(user_id = %user_id, amount, reason = %reason, "Coins credited");

        Ok(transaction)
    }

    /// Whether the ledger already holds a credit for `reason`
    pub async fn has_credit(&self, user_id: &UserId, reason: CoinReason) -> AppResult<bool> {
        let transactions = self.repo.list_by_user(user_id).await?;
        Ok(transactions
            .iter()
            .any(|t| t.reason == reason && t.kind == TransactionKind::Credit))
    }

    pub async fn summary(&self, user_id: &UserId) -> AppResult<WalletSummary> {
        let transactions = self.repo.list_by_user(user_id).await?;
        Ok(WalletSummary {
            balance: compute_balance(&transactions),
            transactions,
        })
    }
}
