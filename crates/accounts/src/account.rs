//! The account record and its public projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user identity as held by the credential store.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    /// PHC-formatted argon2 hash. `None` for accounts that only sign in through OAuth.
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn supports_credentials(&self) -> bool {
        self.password_hash.is_some()
    }

    pub fn public(&self) -> PublicAccount {
        PublicAccount {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &self.password_hash.as_ref().map(|_| "<redacted>"))
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Fields of an account that may leave the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicAccount {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for PublicAccount {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            created_at: account.created_at,
        }
    }
}

/// Canonical form used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Account {
        Account {
            id: "acc_1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: Some("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn public_projection_never_serializes_the_hash() {
        let account = sample();
        let json = serde_json::to_string(&account.public()).unwrap();

        assert!(json.contains("ada@example.com"));
        assert!(!json.contains("argon2"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn debug_output_redacts_the_hash() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("argon2"));
    }

    #[test]
    fn oauth_only_accounts_do_not_support_credentials() {
        let mut account = sample();
        assert!(account.supports_credentials());
        account.password_hash = None;
        assert!(!account.supports_credentials());
    }
}
