//! In-memory repositories

use std::collections::HashMap;

use async_trait::async_trait;
use bhada_common::{OtpId, UserId};
use bhada_errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::StorageProbe;
use crate::domain::account::Account;
use crate::domain::otp::{Identifier, IssueOutcome, IssueThrottle, OtpPurpose, OtpRecord};
use crate::domain::repositories::{AccountRepository, OtpRepository, WalletRepository};
use crate::domain::value_objects::Email;
use crate::domain::wallet::CoinTransaction;

#[derive(Default)]
pub struct InMemoryOtpRepository {
    records: RwLock<Vec<OtpRecord>>,
}

impl InMemoryOtpRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored record, oldest first
    pub async fn all(&self) -> Vec<OtpRecord> {
        self.records.read().await.clone()
    }
}

fn same_pair(record: &OtpRecord, identifier: &Identifier, purpose: OtpPurpose) -> bool {
    record.purpose == purpose && &record.identifier == identifier
}

#[async_trait]
impl OtpRepository for InMemoryOtpRepository {
    async fn save(&self, record: &OtpRecord) -> AppResult<()> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        Ok(())
    }

    async fn issue(&self, record: &OtpRecord, throttle: &IssueThrottle) -> AppResult<IssueOutcome> {
        let now = record.created_at;
        let window_start = throttle.window_start(now);
        let mut records = self.records.write().await;

        let mut latest = None;
        let mut in_window = 0u64;
        for existing in records
            .iter()
            .filter(|r| same_pair(r, &record.identifier, record.purpose))
        {
            latest = latest.max(Some(existing.created_at));
            if existing.created_at >= window_start {
                in_window += 1;
            }
        }
        if let Err(throttled) = throttle.check(latest, in_window, now) {
            return Ok(IssueOutcome::Throttled(throttled));
        }

        let mut superseded = 0;
        for existing in records.iter_mut().filter(|r| {
            same_pair(r, &record.identifier, record.purpose)
                && !r.is_used
                && r.invalidated_at.is_none()
        }) {
            existing.invalidate(now);
            superseded += 1;
        }
        records.push(record.clone());

        Ok(IssueOutcome::Issued { superseded })
    }

    async fn find_latest_active(
        &self,
        identifier: &Identifier,
        purpose: OtpPurpose,
        now: DateTime<Utc>,
    ) -> AppResult<Option<OtpRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| same_pair(r, identifier, purpose) && r.is_active_at(now))
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn claim_attempt(&self, id: &OtpId, max_attempts: u32) -> AppResult<Option<u32>> {
        let mut records = self.records.write().await;
        Ok(records
            .iter_mut()
            .find(|r| &r.id == id)
            .and_then(|record| record.claim_attempt(max_attempts).ok()))
    }

    async fn mark_used(&self, id: &OtpId) -> AppResult<bool> {
        let mut records = self.records.write().await;
        match records
            .iter_mut()
            .find(|r| &r.id == id && !r.is_used && r.invalidated_at.is_none())
        {
            Some(record) => {
                record.is_used = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &OtpId) -> AppResult<()> {
        self.records.write().await.retain(|r| &r.id != id);
        Ok(())
    }

    async fn delete_expired(
        &self,
        expired_before: DateTime<Utc>,
        created_before: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut records = self.records.write().await;
        let len = records.len();
        records.retain(|r| !(r.is_expired_at(expired_before) && r.created_at < created_before));
        Ok((len - records.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: RwLock<HashMap<UserId, Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create(&self, account: &Account) -> AppResult<()> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email == account.email) {
            return Err(AppError::conflict("Email already registered"));
        }
        accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn update(&self, account: &Account) -> AppResult<()> {
        let mut accounts = self.accounts.write().await;
        match accounts.get_mut(&account.id) {
            Some(existing) => {
                *existing = account.clone();
                Ok(())
            }
            None => Err(AppError::not_found(format!("Account {}", account.id))),
        }
    }

    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<Account>> {
        Ok(self.accounts.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AppResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| &a.email == email)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryWalletRepository {
    transactions: RwLock<Vec<CoinTransaction>>,
}

impl InMemoryWalletRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletRepository for InMemoryWalletRepository {
    async fn append(&self, transaction: &CoinTransaction) -> AppResult<()> {
        self.transactions.write().await.push(transaction.clone());
        Ok(())
    }

    async fn list_by_user(&self, user_id: &UserId) -> AppResult<Vec<CoinTransaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .iter()
            .rev()
            .filter(|t| &t.user_id == user_id)
            .cloned()
            .collect())
    }
}

/// Always ready
pub struct MemoryProbe;

#[async_trait]
impl StorageProbe for MemoryProbe {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn check(&self) -> AppResult<()> {
        Ok(())
    }
}
