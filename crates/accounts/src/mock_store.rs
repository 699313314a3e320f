//! In-memory store and exchange doubles for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::account::Account;
use crate::password::verify_password;
use crate::session::{Credentials, SessionExchange, SignInError};
use crate::store::{CredentialStore, NewAccount, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Lookups and writes report the store as unavailable.
    Unavailable,
    /// Lookups miss but the write hits the unique constraint, as when another
    /// request inserted the same email in between.
    RacedDuplicate,
}

#[derive(Clone, Default)]
pub struct MockCredentialStore {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
    writes: Arc<AtomicUsize>,
    next_id: Arc<AtomicUsize>,
    failure: Option<Failure>,
}

impl MockCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(failure: Failure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn count(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn get(&self, email: &str) -> Option<Account> {
        self.accounts.read().await.get(&email.to_lowercase()).cloned()
    }
}

impl CredentialStore for MockCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        match self.failure {
            Some(Failure::Unavailable) => Err(StoreError::Unavailable("store offline".into())),
            Some(Failure::RacedDuplicate) => Ok(None),
            None => Ok(self.get(email).await),
        }
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, StoreError> {
        match self.failure {
            Some(Failure::Unavailable) => {
                return Err(StoreError::Unavailable("store offline".into()))
            }
            Some(Failure::RacedDuplicate) => return Err(StoreError::Duplicate),
            None => {}
        }

        let mut accounts = self.accounts.write().await;
        let key = account.email.to_lowercase();
        if accounts.contains_key(&key) {
            return Err(StoreError::Duplicate);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let stored = Account {
            id: format!("acc_{id}"),
            name: account.name,
            email: account.email,
            password_hash: account.password_hash,
            created_at: Utc::now(),
        };
        accounts.insert(key, stored.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(stored)
    }
}

/// Session exchange that checks credentials against a [`MockCredentialStore`].
#[derive(Clone)]
pub struct MockExchange {
    store: MockCredentialStore,
    broken: bool,
}

impl MockExchange {
    pub fn new(store: MockCredentialStore) -> Self {
        Self {
            store,
            broken: false,
        }
    }

    pub fn broken(store: MockCredentialStore) -> Self {
        Self {
            store,
            broken: true,
        }
    }
}

impl SessionExchange for MockExchange {
    type Session = String;

    async fn sign_in(&self, credentials: &Credentials) -> Result<String, SignInError> {
        if self.broken {
            return Err(SignInError::Unavailable("auth layer offline".into()));
        }

        let account = self
            .store
            .get(&credentials.email)
            .await
            .ok_or(SignInError::InvalidCredentials)?;
        let hash = account
            .password_hash
            .clone()
            .ok_or(SignInError::InvalidCredentials)?;

        let matches = verify_password(credentials.password.clone(), hash)
            .await
            .map_err(|error| SignInError::Unavailable(error.to_string()))?;
        if !matches {
            return Err(SignInError::InvalidCredentials);
        }

        Ok(format!("session-for-{}", account.id))
    }
}
