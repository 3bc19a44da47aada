//! PostgreSQL coin ledger

use async_trait::async_trait;
use bhada_adapter_postgres::map_sqlx_error;
use bhada_common::{TransactionId, UserId};
use bhada_errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::repositories::WalletRepository;
use crate::domain::wallet::{CoinReason, CoinTransaction, TransactionKind};

pub struct PostgresWalletRepository {
    pool: PgPool,
}

impl PostgresWalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct TransactionRow {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    amount: i64,
    reason: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for CoinTransaction {
    type Error = AppError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TransactionId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            kind: row.kind.parse::<TransactionKind>().map_err(AppError::database)?,
            amount: row.amount,
            reason: row.reason.parse::<CoinReason>().map_err(AppError::database)?,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl WalletRepository for PostgresWalletRepository {
    async fn append(&self, transaction: &CoinTransaction) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO coin_transactions (id, user_id, kind, amount, reason, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(transaction.id.0)
        .bind(transaction.user_id.0)
        .bind(transaction.kind.as_str())
        .bind(transaction.amount)
        .bind(transaction.reason.as_str())
        .bind(transaction.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn list_by_user(&self, user_id: &UserId) -> AppResult<Vec<CoinTransaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, user_id, kind, amount, reason, created_at
            FROM coin_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(CoinTransaction::try_from).collect()
    }
}
