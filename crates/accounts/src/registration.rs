//! Turning a registration submission into a persisted account.

use tracing::{debug, error, info};

use crate::account::{normalize_email, PublicAccount};
use crate::error::RegistrationError;
use crate::password::hash_password;
use crate::store::{CredentialStore, NewAccount, StoreError};
use crate::validation::RegistrationRequest;

/// Anything that can register an account: the in-process handler, or a client
/// talking to a remote registration endpoint.
#[allow(async_fn_in_trait)]
pub trait AccountRegistrar {
    async fn register_account(
        &self,
        request: RegistrationRequest,
    ) -> Result<PublicAccount, RegistrationError>;
}

/// Validates, de-duplicates, hashes and persists new accounts.
#[derive(Debug, Clone)]
pub struct RegistrationHandler<S> {
    store: S,
}

impl<S> RegistrationHandler<S>
where
    S: CredentialStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Register a new account. Performs exactly one store write on success and none
    /// on failure.
    pub async fn register(
        &self,
        request: RegistrationRequest,
    ) -> Result<PublicAccount, RegistrationError> {
        if let Err(rejection) = request.validate() {
            debug!(reason = %rejection, "registration rejected");
            return Err(rejection.into());
        }

        let RegistrationRequest {
            name,
            email,
            password,
        } = request;
        let email = normalize_email(&email);

        match self.store.find_by_email(&email).await {
            Ok(Some(_)) => {
                info!("registration refused, email already registered");
                return Err(RegistrationError::Conflict);
            }
            Ok(None) => {}
            Err(store_error) => return Err(internal(store_error.to_string())),
        }

        let password_hash = hash_password(password)
            .await
            .map_err(|hash_error| internal(hash_error.to_string()))?;

        let account = self
            .store
            .insert(NewAccount {
                name: name.trim().to_string(),
                email,
                password_hash: Some(password_hash),
            })
            .await
            .map_err(|store_error| match store_error {
                StoreError::Duplicate => {
                    info!("registration lost a race on the email unique constraint");
                    RegistrationError::Conflict
                }
                StoreError::Unavailable(detail) => internal(detail),
            })?;

        info!(account = %account.id, "account registered");
        Ok(account.public())
    }
}

impl<S> AccountRegistrar for RegistrationHandler<S>
where
    S: CredentialStore,
{
    async fn register_account(
        &self,
        request: RegistrationRequest,
    ) -> Result<PublicAccount, RegistrationError> {
        self.register(request).await
    }
}

fn internal(detail: String) -> RegistrationError {
    error!(error = %detail, "registration failed");
    RegistrationError::Internal(detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_store::{Failure, MockCredentialStore};
    use crate::password::verify_password;
    use crate::validation::ValidationError;

    fn request(name: &str, email: &str, password: &str) -> RegistrationRequest {
        RegistrationRequest::new(name, email, password)
    }

    #[tokio::test]
    async fn valid_submission_creates_one_account_with_hashed_password() {
        let store = MockCredentialStore::new();
        let handler = RegistrationHandler::new(store.clone());

        let account = handler
            .register(request("Ada", "ada@example.com", "secret1"))
            .await
            .expect("registration should succeed");

        assert_eq!(account.name, "Ada");
        assert_eq!(account.email, "ada@example.com");
        assert_eq!(store.writes(), 1);

        let stored = store.get("ada@example.com").await.expect("stored account");
        let hash = stored.password_hash.expect("credential accounts carry a hash");
        assert_ne!(hash, "secret1");
        assert!(verify_password("secret1".into(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn email_is_stored_normalized() {
        let store = MockCredentialStore::new();
        let handler = RegistrationHandler::new(store.clone());

        let account = handler
            .register(request(" Ada ", "  Ada@Example.com ", "secret1"))
            .await
            .unwrap();

        assert_eq!(account.email, "ada@example.com");
        assert_eq!(account.name, "Ada");
    }

    #[tokio::test]
    async fn missing_fields_fail_without_writes() {
        let store = MockCredentialStore::new();
        let handler = RegistrationHandler::new(store.clone());

        for submission in [
            request("", "ada@example.com", "secret1"),
            request("Ada", "", "secret1"),
            request("Ada", "ada@example.com", ""),
        ] {
            let error = handler.register(submission).await.unwrap_err();
            assert!(matches!(
                error,
                RegistrationError::Validation(ValidationError::MissingFields)
            ));
        }

        assert_eq!(store.writes(), 0);
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn short_password_fails_without_writes() {
        let store = MockCredentialStore::new();
        let handler = RegistrationHandler::new(store.clone());

        let error = handler
            .register(request("Ada", "ada@example.com", "abc"))
            .await
            .unwrap_err();

        assert_eq!(
            error.user_message(),
            "Password must be at least 6 characters long"
        );
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn second_registration_with_same_email_conflicts() {
        let store = MockCredentialStore::new();
        let handler = RegistrationHandler::new(store.clone());

        handler
            .register(request("Bob", "bob@example.com", "secret1"))
            .await
            .unwrap();
        let error = handler
            .register(request("Bobby", "BOB@example.com", "another1"))
            .await
            .unwrap_err();

        assert!(matches!(error, RegistrationError::Conflict));
        assert_eq!(store.count().await, 1);
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn unique_violation_during_insert_is_a_conflict() {
        let store = MockCredentialStore::failing(Failure::RacedDuplicate);
        let handler = RegistrationHandler::new(store.clone());

        let error = handler
            .register(request("Bob", "bob@example.com", "secret1"))
            .await
            .unwrap_err();

        assert!(matches!(error, RegistrationError::Conflict));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn unavailable_store_is_an_internal_error() {
        let store = MockCredentialStore::failing(Failure::Unavailable);
        let handler = RegistrationHandler::new(store);

        let error = handler
            .register(request("Ada", "ada@example.com", "secret1"))
            .await
            .unwrap_err();

        assert!(matches!(error, RegistrationError::Internal(_)));
        assert_eq!(error.user_message(), crate::GENERIC_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn repeated_invalid_submissions_never_write() {
        let store = MockCredentialStore::new();
        let handler = RegistrationHandler::new(store.clone());

        for _ in 0..5 {
            let _ = handler
                .register(request("Ada", "ada@example.com", "abc"))
                .await;
        }

        assert_eq!(store.writes(), 0);
        assert!(store.get("ada@example.com").await.is_none());
    }
}
