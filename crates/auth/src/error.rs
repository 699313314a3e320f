use launchpad_accounts::PasswordError;
use launchpad_database::DatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("session not found")]
    SessionNotFound,
    #[error("session expired")]
    SessionExpired,
    #[error("invalid session token")]
    InvalidSession,
    #[error("failed to sign session token: {0}")]
    TokenSigning(String),
    #[error("unknown oauth provider: {0}")]
    UnknownProvider(String),
    #[error("{0} oauth is not configured")]
    ProviderDisabled(String),
    #[error("oauth error: {0}")]
    OAuth(#[from] anyhow::Error),
    #[error("oauth profile has no verified email")]
    MissingOAuthEmail,
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("password verification failed: {0}")]
    Password(#[from] PasswordError),
}
