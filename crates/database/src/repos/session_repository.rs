//! Session repository for database operations.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::entities::SessionRecord;
use crate::error::{classify_insert, DatabaseResult};

#[derive(Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, record: &SessionRecord) -> DatabaseResult<()> {
        sqlx::query("INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)")
            .bind(&record.id)
            .bind(&record.user_id)
            .bind(record.created_at)
            .bind(record.expires_at)
            .execute(&self.pool)
            .await
            .map_err(|error| classify_insert(error, "sessions"))?;

        Ok(())
    }

    pub async fn find(&self, id: &str) -> DatabaseResult<Option<SessionRecord>> {
        let record = sqlx::query_as::<_, SessionRecord>(
            "SELECT id, user_id, created_at, expires_at FROM sessions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Returns whether a row was removed.
    pub async fn delete(&self, id: &str) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_expired(&self) -> DatabaseResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
