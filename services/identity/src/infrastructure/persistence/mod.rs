//! Repository implementations
//!
//! `memory` backs tests and the `memory` storage backend; the `postgres_*`
//! modules back production.

pub mod memory;
mod postgres_account_repository;
mod postgres_otp_repository;
mod postgres_wallet_repository;

pub use postgres_account_repository::PostgresAccountRepository;
pub use postgres_otp_repository::PostgresOtpRepository;
pub use postgres_wallet_repository::PostgresWalletRepository;

use async_trait::async_trait;
use bhada_errors::AppResult;
use sqlx::PgPool;

/// Readiness check for the storage backend
#[async_trait]
pub trait StorageProbe: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn check(&self) -> AppResult<()>;
}

pub struct PostgresProbe {
    pool: PgPool,
}

impl PostgresProbe {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StorageProbe for PostgresProbe {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn check(&self) -> AppResult<()> {
        bhada_adapter_postgres::check_connection(&self.pool)
            .await
            .map(|_| ())
    }
}
