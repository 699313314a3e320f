//! Account repository: the SQLite credential store.

use chrono::{DateTime, Utc};
use cuid2::CuidConstructor;
use launchpad_accounts::{Account, CredentialStore, NewAccount, StoreError};
use once_cell::sync::Lazy;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::entities::OAuthLink;
use crate::error::{classify_insert, DatabaseError, DatabaseResult};

static CUID: Lazy<CuidConstructor> = Lazy::new(CuidConstructor::new);

const ACCOUNT_COLUMNS: &str = "id, name, email, password_hash, created_at";

#[derive(FromRow)]
struct AccountRow {
    id: String,
    name: String,
    email: String,
    password_hash: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct OAuthLinkRow {
    user_id: String,
    provider: String,
    provider_account_id: String,
    created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Case-insensitive through the column collation.
    pub async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    pub async fn find_by_id(&self, id: &str) -> DatabaseResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    /// Insert in a single statement; the UNIQUE email constraint decides races.
    pub async fn create(&self, account: NewAccount) -> DatabaseResult<Account> {
        let created = Account {
            id: CUID.create_id(),
            name: account.name,
            email: account.email,
            password_hash: account.password_hash,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&created.id)
        .bind(&created.name)
        .bind(&created.email)
        .bind(created.password_hash.as_deref())
        .bind(created.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| classify_insert(error, "users.email"))?;

        debug!(account = %created.id, "inserted account row");
        Ok(created)
    }

    pub async fn count(&self) -> DatabaseResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_by_email(&self, email: &str) -> DatabaseResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email.trim())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn find_by_oauth(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> DatabaseResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT u.id, u.name, u.email, u.password_hash, u.created_at
             FROM users u
             JOIN oauth_accounts o ON o.user_id = u.id
             WHERE o.provider = ? AND o.provider_account_id = ?",
        )
        .bind(provider)
        .bind(provider_account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    pub async fn link_oauth_account(
        &self,
        user_id: &str,
        provider: &str,
        provider_account_id: &str,
    ) -> DatabaseResult<OAuthLink> {
        let link = OAuthLink {
            user_id: user_id.to_string(),
            provider: provider.to_string(),
            provider_account_id: provider_account_id.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO oauth_accounts (user_id, provider, provider_account_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&link.user_id)
        .bind(&link.provider)
        .bind(&link.provider_account_id)
        .bind(link.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| classify_insert(error, "oauth_accounts"))?;

        Ok(link)
    }

    /// Create a password-less account and its OAuth link together.
    pub async fn create_with_oauth(
        &self,
        account: NewAccount,
        provider: &str,
        provider_account_id: &str,
    ) -> DatabaseResult<Account> {
        let created = Account {
            id: CUID.create_id(),
            name: account.name,
            email: account.email,
            password_hash: None,
            created_at: Utc::now(),
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, created_at) VALUES (?, ?, ?, NULL, ?)",
        )
        .bind(&created.id)
        .bind(&created.name)
        .bind(&created.email)
        .bind(created.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|error| classify_insert(error, "users.email"))?;

        sqlx::query(
            "INSERT INTO oauth_accounts (user_id, provider, provider_account_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&created.id)
        .bind(provider)
        .bind(provider_account_id)
        .bind(created.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|error| classify_insert(error, "oauth_accounts"))?;

        tx.commit().await?;
        Ok(created)
    }

    pub async fn oauth_links(&self, user_id: &str) -> DatabaseResult<Vec<OAuthLink>> {
        let rows = sqlx::query_as::<_, OAuthLinkRow>(
            "SELECT user_id, provider, provider_account_id, created_at
             FROM oauth_accounts WHERE user_id = ? ORDER BY provider",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| OAuthLink {
                user_id: row.user_id,
                provider: row.provider,
                provider_account_id: row.provider_account_id,
                created_at: row.created_at,
            })
            .collect())
    }
}

impl From<DatabaseError> for StoreError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::Duplicate(_) => StoreError::Duplicate,
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

impl CredentialStore for AccountRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(AccountRepository::find_by_email(self, email).await?)
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, StoreError> {
        Ok(self.create(account).await?)
    }
}
