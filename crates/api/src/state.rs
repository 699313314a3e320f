use launchpad_accounts::{RegistrationHandler, SignupFlow};
use launchpad_auth::{AuthSession, Authenticator};
use launchpad_database::AccountRepository;

use crate::{ApiError, OAuthStateStore};

pub type Registration = RegistrationHandler<AccountRepository>;
pub type Signup = SignupFlow<Registration, Authenticator>;

/// Shared handles for request handlers. Everything is injected here; handlers hold
/// no state of their own.
#[derive(Clone)]
pub struct AppState {
    authenticator: Authenticator,
    signup: Signup,
    oauth_state: OAuthStateStore,
}

impl AppState {
    pub fn new(authenticator: Authenticator) -> Self {
        Self::with_oauth_store(authenticator, OAuthStateStore::default())
    }

    pub fn with_oauth_store(authenticator: Authenticator, oauth_state: OAuthStateStore) -> Self {
        let registration = RegistrationHandler::new(authenticator.accounts().clone());
        let signup = SignupFlow::new(
            registration,
            authenticator.clone(),
            authenticator.redirects().clone(),
        );

        Self {
            authenticator,
            signup,
            oauth_state,
        }
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn registration(&self) -> &Registration {
        self.signup.registrar()
    }

    pub fn signup(&self) -> &Signup {
        &self.signup
    }

    pub fn oauth_state(&self) -> &OAuthStateStore {
        &self.oauth_state
    }

    pub async fn authenticate(&self, token: &str) -> Result<AuthSession, ApiError> {
        self.authenticator
            .authenticate_token(token)
            .await
            .map_err(ApiError::from)
    }
}
