//! Password hashing and verification.
//!
//! Argon2id with fixed parameters, PHC string output. Both operations are CPU-bound
//! and run on the blocking thread pool.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),

    #[error("stored password hash is malformed: {0}")]
    MalformedHash(argon2::password_hash::Error),

    #[error("password worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

fn hasher() -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default())
}

/// Hash a password with a fresh random salt.
pub async fn hash_password(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password_sync(&password)).await?
}

/// Check a password against a stored PHC hash. A wrong password is `Ok(false)`.
pub async fn verify_password(password: String, hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password_sync(&password, &hash)).await?
}

fn hash_password_sync(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()
        .hash_password(password.as_bytes(), &salt)
        .map_err(PasswordError::Hash)?;
    Ok(hash.to_string())
}

fn verify_password_sync(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(PasswordError::MalformedHash)?;
    Ok(hasher()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hashes_verify_and_never_contain_plaintext() {
        let hash = hash_password("secret1".to_string()).await.unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("secret1"));
        assert!(verify_password("secret1".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("secret2".into(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn same_password_gets_different_salts() {
        let first = hash_password("secret1".to_string()).await.unwrap();
        let second = hash_password("secret1".to_string()).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn malformed_hash_is_an_error() {
        let error = verify_password("secret1".into(), "not-a-hash".into())
            .await
            .unwrap_err();
        assert!(matches!(error, PasswordError::MalformedHash(_)));
    }
}
