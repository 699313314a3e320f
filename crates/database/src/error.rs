//! Error types for the database layer

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Database query error: {0}")]
    QueryError(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    MigrationError(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Map an insert failure, turning unique-constraint violations into `Duplicate`.
pub(crate) fn classify_insert(error: sqlx::Error, entity: &str) -> DatabaseError {
    match &error {
        sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
            DatabaseError::Duplicate(entity.to_string())
        }
        _ => DatabaseError::QueryError(error),
    }
}
