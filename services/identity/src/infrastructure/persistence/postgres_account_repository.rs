//! PostgreSQL account repository

use async_trait::async_trait;
use bhada_adapter_postgres::map_sqlx_error;
use bhada_common::UserId;
use bhada_errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::domain::account::{Account, AccountRole};
use crate::domain::repositories::AccountRepository;
use crate::domain::value_objects::{Email, HashedPassword, Phone};

const COLUMNS: &str = "id, email, phone, name, role, password_hash, email_verified, \
                       phone_verified, created_at, updated_at";

pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    phone: Option<String>,
    name: Option<String>,
    role: String,
    password_hash: Option<String>,
    email_verified: bool,
    phone_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = AppError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let corrupt = |e: String| AppError::database(format!("Corrupt accounts row {}: {}", row.id, e));

        Ok(Self {
            id: UserId::from_uuid(row.id),
            email: Email::new(row.email).map_err(|e| corrupt(e.to_string()))?,
            phone: row
                .phone
                .map(Phone::new)
                .transpose()
                .map_err(|e| corrupt(e.to_string()))?,
            name: row.name,
            role: row.role.parse::<AccountRole>().map_err(corrupt)?,
            password_hash: row.password_hash.map(HashedPassword::from_hash),
            email_verified: row.email_verified,
            phone_verified: row.phone_verified,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create(&self, account: &Account) -> AppResult<()> {
        debug!(user_id = %account.id, "Inserting account");

        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, email, phone, name, role, password_hash,
                email_verified, phone_verified, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(account.id.0)
        .bind(account.email.as_str())
        .bind(account.phone.as_ref().map(|p| p.as_str()))
        .bind(account.name.as_deref())
        .bind(account.role.as_str())
        .bind(account.password_hash.as_ref().map(|h| h.as_str()))
        .bind(account.email_verified)
        .bind(account.phone_verified)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn update(&self, account: &Account) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE accounts SET
                email = $2,
                phone = $3,
                name = $4,
                role = $5,
                password_hash = $6,
                email_verified = $7,
                phone_verified = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(account.id.0)
        .bind(account.email.as_str())
        .bind(account.phone.as_ref().map(|p| p.as_str()))
        .bind(account.name.as_deref())
        .bind(account.role.as_str())
        .bind(account.password_hash.as_ref().map(|h| h.as_str()))
        .bind(account.email_verified)
        .bind(account.phone_verified)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Account {}", account.id)));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<Account>> {
        let sql = format!("SELECT {COLUMNS} FROM accounts WHERE id = $1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(Account::try_from).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AppResult<Option<Account>> {
        let sql = format!("SELECT {COLUMNS} FROM accounts WHERE email = $1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(Account::try_from).transpose()
    }
}
