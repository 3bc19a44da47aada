//! SQLx error mapping

use bhada_errors::AppError;

/// Map a SQLx error to an AppError, keeping constraint violations distinguishable
pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::RowNotFound => AppError::not_found("Record not found"),
        sqlx::Error::Database(db_err) => match db_err.code() {
            Some(code) => match code.as_ref() {
                "23505" => AppError::conflict("Duplicate entry violates unique constraint"),
                "23503" => AppError::validation("Foreign key constraint violation"),
                "23514" => AppError::validation("Check constraint violation"),
                "23502" => AppError::validation("Not null constraint violation"),
                _ => AppError::database(format!("Database error ({}): {}", code, db_err)),
            },
            None => AppError::database(db_err.to_string()),
        },
        sqlx::Error::PoolTimedOut => AppError::internal("Database connection pool timeout"),
        sqlx::Error::PoolClosed => AppError::internal("Database connection pool is closed"),
        _ => AppError::database(e.to_string()),
    }
}
