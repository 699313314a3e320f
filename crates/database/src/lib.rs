//! Launchpad Database Crate
//!
//! SQLite persistence: connection management, embedded migrations, the account
//! repository that backs the credential store, and the session table used for
//! token revocation.

use launchpad_config::DatabaseConfig;
use sqlx::SqlitePool;

pub mod connection;
pub mod entities;
pub mod error;
pub mod migrations;
pub mod repos;

pub use connection::{prepare_database, DatabaseConnection};
pub use entities::{OAuthLink, SessionRecord};
pub use error::{DatabaseError, DatabaseResult};
pub use migrations::{run_migrations, MIGRATOR};
pub use repos::{AccountRepository, SessionRepository};

/// Open the pool and bring the schema up to date.
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(format!("{e:#}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("{e:#}")))?;

    Ok(pool)
}
