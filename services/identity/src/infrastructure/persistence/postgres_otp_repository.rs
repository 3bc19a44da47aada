//! PostgreSQL OTP repository

use async_trait::async_trait;
use bhada_adapter_postgres::map_sqlx_error;
use bhada_common::OtpId;
use bhada_errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{FromRow, PgPool, Postgres};
use tracing::debug;
use uuid::Uuid;

use crate::domain::otp::{Identifier, IssueOutcome, IssueThrottle, OtpPurpose, OtpRecord};
use crate::domain::repositories::OtpRepository;

const COLUMNS: &str =
    "id, email, phone, otp, purpose, is_used, attempts, invalidated_at, expires_at, created_at";

pub struct PostgresOtpRepository {
    pool: PgPool,
}

impl PostgresOtpRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct OtpRow {
    id: Uuid,
    email: Option<String>,
    phone: Option<String>,
    otp: String,
    purpose: String,
    is_used: bool,
    attempts: i32,
    invalidated_at: Option<DateTime<Utc>>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OtpRow> for OtpRecord {
    type Error = AppError;

    fn try_from(row: OtpRow) -> Result<Self, Self::Error> {
        let identifier = Identifier::from_columns(row.email, row.phone)
            .map_err(|e| AppError::database(format!("Corrupt otp_records row {}: {}", row.id, e)))?;
        let purpose = row
            .purpose
            .parse::<OtpPurpose>()
            .map_err(AppError::database)?;

        Ok(Self {
            id: OtpId::from_uuid(row.id),
            identifier,
            code_hash: row.otp,
            purpose,
            is_used: row.is_used,
            attempts: u32::try_from(row.attempts).unwrap_or(0),
            invalidated_at: row.invalidated_at,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}

/// Column holding the identifier, and its value. The column name is never user input.
fn identifier_column(identifier: &Identifier) -> (&'static str, &str) {
    match identifier {
        Identifier::Email(email) => ("email", email.as_str()),
        Identifier::Phone(phone) => ("phone", phone.as_str()),
    }
}

const INSERT_SQL: &str = r#"
    INSERT INTO otp_records (
        id, email, phone, otp, purpose, is_used, attempts,
        invalidated_at, expires_at, created_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
    ON CONFLICT (id) DO UPDATE SET
        is_used = EXCLUDED.is_used,
        attempts = EXCLUDED.attempts,
        invalidated_at = EXCLUDED.invalidated_at
"#;

fn insert_query(record: &OtpRecord) -> Query<'_, Postgres, PgArguments> {
    sqlx::query(INSERT_SQL)
        .bind(record.id.0)
        .bind(record.identifier.email().map(|e| e.as_str()))
        .bind(record.identifier.phone().map(|p| p.as_str()))
        .bind(&record.code_hash)
        .bind(record.purpose.as_str())
        .bind(record.is_used)
        .bind(i32::try_from(record.attempts).unwrap_or(i32::MAX))
        .bind(record.invalidated_at)
        .bind(record.expires_at)
        .bind(record.created_at)
}

#[async_trait]
impl OtpRepository for PostgresOtpRepository {
    async fn save(&self, record: &OtpRecord) -> AppResult<()> {
        debug!(otp_id = %record.id, purpose = %record.purpose, "Saving OTP record");

        insert_query(record)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn issue(&self, record: &OtpRecord, throttle: &IssueThrottle) -> AppResult<IssueOutcome> {
        let (column, value) = identifier_column(&record.identifier);
        let purpose = record.purpose.as_str();
        let now = record.created_at;

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        // Serializes issuance per identifier and purpose until commit
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(format!("otp:{column}:{value}:{purpose}"))
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let sql = format!(
            "SELECT MAX(created_at), COUNT(*) FILTER (WHERE created_at >= $3)
             FROM otp_records
             WHERE {column} = $1 AND purpose = $2"
        );
        let (latest, in_window): (Option<DateTime<Utc>>, i64) = sqlx::query_as(&sql)
            .bind(value)
            .bind(purpose)
            .bind(throttle.window_start(now))
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if let Err(throttled) = throttle.check(latest, in_window.max(0) as u64, now) {
            tx.rollback().await.map_err(map_sqlx_error)?;
            return Ok(IssueOutcome::Throttled(throttled));
        }

        let sql = format!(
            "UPDATE otp_records SET invalidated_at = $3
             WHERE {column} = $1 AND purpose = $2
               AND is_used = FALSE AND invalidated_at IS NULL"
        );
        let superseded = sqlx::query(&sql)
            .bind(value)
            .bind(purpose)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        insert_query(record)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        debug!(otp_id = %record.id, purpose = %record.purpose, superseded, "OTP record issued");
        Ok(IssueOutcome::Issued { superseded })
    }

    async fn find_latest_active(
        &self,
        identifier: &Identifier,
        purpose: OtpPurpose,
        now: DateTime<Utc>,
    ) -> AppResult<Option<OtpRecord>> {
        let (column, value) = identifier_column(identifier);
        let sql = format!(
            "SELECT {COLUMNS} FROM otp_records
             WHERE {column} = $1 AND purpose = $2
               AND is_used = FALSE AND invalidated_at IS NULL AND expires_at > $3
             ORDER BY created_at DESC
             LIMIT 1"
        );

        let row = sqlx::query_as::<_, OtpRow>(&sql)
            .bind(value)
            .bind(purpose.as_str())
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(OtpRecord::try_from).transpose()
    }

    async fn claim_attempt(&self, id: &OtpId, max_attempts: u32) -> AppResult<Option<u32>> {
        let attempts: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE otp_records SET attempts = attempts + 1
            WHERE id = $1 AND is_used = FALSE AND invalidated_at IS NULL AND attempts < $2
            RETURNING attempts
            "#,
        )
        .bind(id.0)
        .bind(i32::try_from(max_attempts).unwrap_or(i32::MAX))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(attempts.map(|n| u32::try_from(n).unwrap_or(0)))
    }

    async fn mark_used(&self, id: &OtpId) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE otp_records SET is_used = TRUE
            WHERE id = $1 AND is_used = FALSE AND invalidated_at IS NULL
            "#,
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: &OtpId) -> AppResult<()> {
        sqlx::query("DELETE FROM otp_records WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn delete_expired(
        &self,
        expired_before: DateTime<Utc>,
        created_before: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM otp_records WHERE expires_at <= $1 AND created_at < $2")
            .bind(expired_before)
            .bind(created_before)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
