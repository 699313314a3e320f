//! The credential store seam.

use thiserror::Error;

use crate::account::Account;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store's uniqueness constraint on email rejected the write.
    #[error("an account with this email already exists")]
    Duplicate,

    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// Data for a new account. The store assigns `id` and `created_at`.
#[derive(Clone)]
pub struct NewAccount {
    pub name: String,
    /// Already normalized.
    pub email: String,
    pub password_hash: Option<String>,
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Durable account storage.
///
/// `insert` must be atomic with respect to email uniqueness (case-insensitive) and
/// report a violated constraint as [`StoreError::Duplicate`]; a read-then-write in
/// the caller cannot prevent concurrent duplicates on its own.
#[allow(async_fn_in_trait)]
pub trait CredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn insert(&self, account: NewAccount) -> Result<Account, StoreError>;
}
