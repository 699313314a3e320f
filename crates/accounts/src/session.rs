//! Signing a freshly registered user in.
//!
//! Account creation and session establishment hit different systems and are not
//! atomic together. A failed bootstrap never undoes the registration; the user is
//! sent to the sign-in page instead.

use thiserror::Error;
use tracing::{info, warn};

/// Shown when the account exists but the automatic sign-in did not go through.
pub const MANUAL_SIGN_IN_MESSAGE: &str =
    "Your account was created, but we could not sign you in automatically. Please sign in.";

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum SignInError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("sign-in unavailable: {0}")]
    Unavailable(String),
}

/// The credential sign-in exchange of the auth layer.
#[allow(async_fn_in_trait)]
pub trait SessionExchange {
    type Session;

    async fn sign_in(&self, credentials: &Credentials) -> Result<Self::Session, SignInError>;
}

/// Where to send the client after signup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTargets {
    pub landing: String,
    pub sign_in: String,
}

impl Default for RedirectTargets {
    fn default() -> Self {
        Self {
            landing: "/".to_string(),
            sign_in: "/login".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome<S> {
    Established { session: S, redirect_to: String },
    SignInRequired { redirect_to: String, message: String },
}

impl<S> BootstrapOutcome<S> {
    pub fn is_established(&self) -> bool {
        matches!(self, Self::Established { .. })
    }

    pub fn redirect_to(&self) -> &str {
        match self {
            Self::Established { redirect_to, .. } | Self::SignInRequired { redirect_to, .. } => {
                redirect_to
            }
        }
    }

    pub fn session(&self) -> Option<&S> {
        match self {
            Self::Established { session, .. } => Some(session),
            Self::SignInRequired { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionBootstrap<E> {
    exchange: E,
    redirects: RedirectTargets,
}

impl<E> SessionBootstrap<E>
where
    E: SessionExchange,
{
    pub fn new(exchange: E, redirects: RedirectTargets) -> Self {
        Self {
            exchange,
            redirects,
        }
    }

    pub async fn bootstrap(&self, credentials: &Credentials) -> BootstrapOutcome<E::Session> {
        match self.exchange.sign_in(credentials).await {
            Ok(session) => {
                info!("session established after registration");
                BootstrapOutcome::Established {
                    session,
                    redirect_to: self.redirects.landing.clone(),
                }
            }
            Err(error) => {
                warn!(%error, "automatic sign-in after registration failed");
                BootstrapOutcome::SignInRequired {
                    redirect_to: self.redirects.sign_in.clone(),
                    message: MANUAL_SIGN_IN_MESSAGE.to_string(),
                }
            }
        }
    }
}
