//! # Launchpad Accounts Crate
//!
//! Domain logic for creating accounts and getting a new user signed in.
//!
//! ## Architecture
//!
//! - **Registration**: validates a submission, enforces email uniqueness, hashes the
//!   password and persists the account through a [`CredentialStore`]
//! - **Session bootstrap**: exchanges fresh credentials for a session through a
//!   [`SessionExchange`] without ever rolling the registration back
//! - **Provider discovery**: reads the configured sign-in methods from a
//!   [`ProviderCatalog`] and partitions them into the credentials form and OAuth buttons
//! - **Signup flow**: the two steps above as independently observable outcomes
//!
//! Storage and the auth layer are injected; nothing in this crate holds global state.

pub mod account;
pub mod error;
pub mod password;
pub mod providers;
pub mod registration;
pub mod session;
pub mod signup;
pub mod store;
pub mod validation;

#[cfg(test)]
mod mock_store;

pub use account::{normalize_email, Account, PublicAccount};
pub use error::{RegistrationError, GENERIC_FAILURE_MESSAGE};
pub use password::{hash_password, verify_password, PasswordError};
pub use providers::{
    discover, DiscoveryError, OAuthButton, Provider, ProviderCatalog, ProviderDescriptor,
    ProviderMap, ProviderType, SignInOptions,
};
pub use registration::{AccountRegistrar, RegistrationHandler};
pub use session::{
    BootstrapOutcome, Credentials, RedirectTargets, SessionBootstrap, SessionExchange,
    SignInError, MANUAL_SIGN_IN_MESSAGE,
};
pub use signup::{SignupFlow, SignupOutcome};
pub use store::{CredentialStore, NewAccount, StoreError};
pub use validation::{RegistrationForm, RegistrationRequest, ValidationError, MIN_PASSWORD_LENGTH};
