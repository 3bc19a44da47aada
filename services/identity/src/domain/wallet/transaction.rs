//! Coin wallet ledger

use bhada_common::{TransactionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            other => Err(format!("Unknown transaction kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoinReason {
    WelcomeBonus,
    Referral,
    Listing,
    Redemption,
    Adjustment,
}

impl CoinReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WelcomeBonus => "welcome_bonus",
            Self::Referral => "referral",
            Self::Listing => "listing",
            Self::Redemption => "redemption",
            Self::Adjustment => "adjustment",
        }
    }
}

impl fmt::Display for CoinReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoinReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "welcome_bonus" => Ok(Self::WelcomeBonus),
            "referral" => Ok(Self::Referral),
            "listing" => Ok(Self::Listing),
            "redemption" => Ok(Self::Redemption),
            "adjustment" => Ok(Self::Adjustment),
            other => Err(format!("Unknown coin reason: {}", other)),
        }
    }
}

/// One immutable ledger entry. `amount` is always positive; `kind` carries the sign.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinTransaction {
    pub id: TransactionId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: i64,
    pub reason: CoinReason,
    pub created_at: DateTime<Utc>,
}

impl CoinTransaction {
    pub fn credit(user_id: UserId, amount: i64, reason: CoinReason) -> Result<Self, WalletError> {
        Self::new(user_id, TransactionKind::Credit, amount, reason)
    }

    pub fn debit(user_id: UserId, amount: i64, reason: CoinReason) -> Result<Self, WalletError> {
        Self::new(user_id, TransactionKind::Debit, amount, reason)
    }

    fn new(
        user_id: UserId,
        kind: TransactionKind,
        amount: i64,
        reason: CoinReason,
    ) -> Result<Self, WalletError> {
        if amount <= 0 {
            return Err(WalletError::NonPositiveAmount(amount));
        }
        Ok(Self {
            id: TransactionId::new(),
            user_id,
            kind,
            amount,
            reason,
            created_at: Utc::now(),
        })
    }

    pub fn signed_amount(&self) -> i64 {
        match self.kind {
            TransactionKind::Credit => self.amount,
            TransactionKind::Debit => -self.amount,
        }
    }
}

/// Credits minus debits. The empty ledger has balance 0; the result may be negative.
pub fn compute_balance<'a, I>(transactions: I) -> i64
where
    I: IntoIterator<Item = &'a CoinTransaction>,
{
    transactions
        .into_iter()
        .map(CoinTransaction::signed_amount)
        .sum()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("Transaction amount must be positive, got {0}")]
    NonPositiveAmount(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credit(amount: i64) -> CoinTransaction {
        CoinTransaction::credit(UserId::new(), amount, CoinReason::Adjustment).unwrap()
    }

    fn debit(amount: i64) -> CoinTransaction {
        CoinTransaction::debit(UserId::new(), amount, CoinReason::Redemption).unwrap()
    }

    #[test]
    fn test_empty_ledger() {
        assert_eq!(compute_balance(std::iter::empty()), 0);
    }

    #[test]
    fn test_single_credit() {
        assert_eq!(compute_balance(&[credit(100)]), 100);
    }

    #[test]
    fn test_credits_and_debits() {
        assert_eq!(compute_balance(&[credit(100), debit(30), credit(50)]), 120);
    }

    #[test]
    fn test_credit_then_debit() {
        assert_eq!(compute_balance(&[credit(100), debit(40)]), 60);
    }

    #[test]
    fn test_balance_may_go_negative() {
        assert_eq!(compute_balance(&[debit(10)]), -10);
    }

    #[test]
    fn test_order_does_not_matter() {
        let a = vec![credit(5), debit(3), credit(7)];
        let b = vec![credit(7), credit(5), debit(3)];
        assert_eq!(compute_balance(&a), compute_balance(&b));
    }

    #[test]
    fn test_amount_must_be_positive() {
        assert_eq!(
            CoinTransaction::credit(UserId::new(), 0, CoinReason::Adjustment).unwrap_err(),
            WalletError::NonPositiveAmount(0)
        );
        assert!(CoinTransaction::debit(UserId::new(), -5, CoinReason::Redemption).is_err());
    }

    #[test]
    fn test_serialized_kind_is_type() {
        let json = serde_json::to_value(credit(10)).unwrap();
        assert_eq!(json["type"], "credit");
        assert_eq!(json["reason"], "adjustment");
        assert_eq!(json["amount"], 10);
    }
}
