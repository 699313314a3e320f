//! Launchpad authentication.
//!
//! [`Authenticator`] owns credential sign-in, session issue/validation/revocation and
//! OAuth linking. It is also the auth layer the accounts crate talks to: it
//! implements [`SessionExchange`] for session bootstrap and [`ProviderCatalog`] for
//! provider discovery.

use chrono::{DateTime, Duration, Utc};
use launchpad_accounts::{
    normalize_email, verify_password, Account, Credentials, DiscoveryError, NewAccount,
    ProviderCatalog, ProviderDescriptor, ProviderMap, PublicAccount, RedirectTargets,
    SessionExchange, SignInError,
};
use launchpad_config::AuthConfig;
use launchpad_database::{AccountRepository, DatabaseError, SessionRecord, SessionRepository};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

mod error;
pub mod oauth;
pub mod token;

pub use error::AuthError;
pub use oauth::{OAuthClient, OAuthProfile, OAuthProvider};
pub use token::{SessionClaims, SessionSigner, TOKEN_ISSUER};

/// Upper bound for a session's lifetime, whatever the configuration says.
const MAX_SESSION_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

#[derive(Clone)]
pub struct Authenticator {
    accounts: AccountRepository,
    sessions: SessionRepository,
    signer: SessionSigner,
    session_ttl: Duration,
    redirects: RedirectTargets,
    github: Option<OAuthClient>,
    google: Option<OAuthClient>,
}

/// An issued session: the bearer token plus what it resolves to.
#[derive(Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub session_id: String,
    pub account: PublicAccount,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("session_id", &self.session_id)
            .field("account", &self.account.id)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    pub fn new(pool: SqlitePool, config: &AuthConfig) -> Result<Self, AuthError> {
        let ttl_seconds = i64::try_from(config.session_ttl_seconds)
            .unwrap_or(i64::MAX)
            .clamp(1, MAX_SESSION_TTL_SECONDS);

        Ok(Self {
            accounts: AccountRepository::new(pool.clone()),
            sessions: SessionRepository::new(pool),
            signer: SessionSigner::new(&config.session_secret),
            session_ttl: Duration::seconds(ttl_seconds),
            redirects: RedirectTargets {
                landing: config.landing_path.clone(),
                sign_in: config.sign_in_path.clone(),
            },
            github: OAuthClient::from_config(OAuthProvider::GitHub, &config.github)?,
            google: OAuthClient::from_config(OAuthProvider::Google, &config.google)?,
        })
    }

    pub fn accounts(&self) -> &AccountRepository {
        &self.accounts
    }

    pub fn redirects(&self) -> &RedirectTargets {
        &self.redirects
    }

    pub fn enabled_providers(&self) -> Vec<OAuthProvider> {
        OAuthProvider::ALL
            .into_iter()
            .filter(|provider| self.oauth_client(*provider).is_ok())
            .collect()
    }

    /// Every sign-in method currently available: credentials always, plus each
    /// OAuth provider with complete client credentials.
    pub fn provider_map(&self) -> ProviderMap {
        let mut providers = ProviderMap::new();
        let credentials = ProviderDescriptor::credentials();
        providers.insert(credentials.id.clone(), credentials);

        for provider in self.enabled_providers() {
            providers.insert(
                provider.id().to_string(),
                ProviderDescriptor::oauth(provider.id(), provider.display_name()),
            );
        }

        providers
    }

    pub async fn login_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email);
        let Some(account) = self.accounts.find_by_email(&email).await? else {
            debug!("sign-in for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        // OAuth-only accounts have nothing to compare against.
        let Some(hash) = account.password_hash.clone() else {
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password.to_string(), hash).await? {
            debug!(account = %account.id, "sign-in with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_session(&account).await
    }

    pub async fn authenticate_token(&self, token: &str) -> Result<AuthSession, AuthError> {
        let claims = match self.signer.verify(token) {
            Ok(claims) => claims,
            Err(AuthError::SessionExpired) => {
                self.discard_expired(token).await?;
                return Err(AuthError::SessionExpired);
            }
            Err(other) => return Err(other),
        };

        let record = self
            .sessions
            .find(&claims.sid)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if record.user_id != claims.sub {
            warn!(session = %record.id, "session token subject does not match its session");
            return Err(AuthError::InvalidSession);
        }

        if record.is_expired_at(Utc::now()) {
            self.sessions.delete(&record.id).await?;
            return Err(AuthError::SessionExpired);
        }

        let account = self
            .accounts
            .find_by_id(&record.user_id)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        Ok(AuthSession {
            token: token.to_owned(),
            session_id: record.id,
            account: account.public(),
            expires_at: record.expires_at,
        })
    }

    /// Logout. Expired tokens are accepted so their row still goes away.
    pub async fn revoke_session(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.signer.verify_ignoring_expiry(token)?;

        if !self.sessions.delete(&claims.sid).await? {
            return Err(AuthError::SessionNotFound);
        }

        info!(session = %claims.sid, "session revoked");
        Ok(())
    }

    pub fn ensure_oauth_enabled(&self, provider: OAuthProvider) -> Result<(), AuthError> {
        self.oauth_client(provider).map(|_| ())
    }

    pub fn oauth_authorization_url(
        &self,
        provider: OAuthProvider,
        state: &str,
        redirect_uri: &str,
    ) -> Result<String, AuthError> {
        let client = self.oauth_client(provider)?;
        Ok(client.authorize_url(state, redirect_uri)?)
    }

    pub async fn login_with_oauth_code(
        &self,
        provider: OAuthProvider,
        code: &str,
        redirect_uri: &str,
    ) -> Result<AuthSession, AuthError> {
        let client = self.oauth_client(provider)?;
        let profile = client.exchange_code(code, redirect_uri).await?;
        self.login_with_oauth_profile(provider, profile).await
    }

    /// Resolve a verified provider profile to an account and sign it in.
    ///
    /// Lookup order: an existing link for `(provider, profile.id)`, then an account
    /// with the same email (which gets linked), then a new password-less account.
    pub async fn login_with_oauth_profile(
        &self,
        provider: OAuthProvider,
        profile: OAuthProfile,
    ) -> Result<AuthSession, AuthError> {
        if let Some(account) = self
            .accounts
            .find_by_oauth(provider.id(), &profile.id)
            .await?
        {
            return self.issue_session(&account).await;
        }

        let email = profile
            .email
            .as_deref()
            .map(normalize_email)
            .filter(|email| !email.is_empty())
            .ok_or(AuthError::MissingOAuthEmail)?;

        let account = match self.accounts.find_by_email(&email).await? {
            Some(existing) => self.link_existing(existing, provider, &profile.id).await?,
            None => {
                let new_account = NewAccount {
                    name: profile.display_name(&email),
                    email: email.clone(),
                    password_hash: None,
                };
                match self
                    .accounts
                    .create_with_oauth(new_account, provider.id(), &profile.id)
                    .await
                {
                    Ok(created) => {
                        info!(account = %created.id, %provider, "created account from oauth profile");
                        created
                    }
                    Err(DatabaseError::Duplicate(_)) => {
                        self.resolve_raced_oauth(provider, &profile.id, &email)
                            .await?
                    }
                    Err(other) => return Err(other.into()),
                }
            }
        };

        self.issue_session(&account).await
    }

    async fn link_existing(
        &self,
        account: Account,
        provider: OAuthProvider,
        provider_account_id: &str,
    ) -> Result<Account, AuthError> {
        match self
            .accounts
            .link_oauth_account(&account.id, provider.id(), provider_account_id)
            .await
        {
            Ok(_) => {
                info!(account = %account.id, %provider, "linked oauth identity");
                Ok(account)
            }
            Err(DatabaseError::Duplicate(entity)) => self
                .accounts
                .find_by_oauth(provider.id(), provider_account_id)
                .await?
                .ok_or(AuthError::Database(DatabaseError::Duplicate(entity))),
            Err(other) => Err(other.into()),
        }
    }

    // Another request created the account or the link between our lookups and insert.
    async fn resolve_raced_oauth(
        &self,
        provider: OAuthProvider,
        provider_account_id: &str,
        email: &str,
    ) -> Result<Account, AuthError> {
        if let Some(account) = self
            .accounts
            .find_by_oauth(provider.id(), provider_account_id)
            .await?
        {
            return Ok(account);
        }

        match self.accounts.find_by_email(email).await? {
            Some(account) => self.link_existing(account, provider, provider_account_id).await,
            None => Err(AuthError::Database(DatabaseError::Duplicate(
                "users.email".to_string(),
            ))),
        }
    }

    fn oauth_client(&self, provider: OAuthProvider) -> Result<&OAuthClient, AuthError> {
        let client = match provider {
            OAuthProvider::GitHub => self.github.as_ref(),
            OAuthProvider::Google => self.google.as_ref(),
        };
        client.ok_or_else(|| AuthError::ProviderDisabled(provider.id().to_string()))
    }

    async fn discard_expired(&self, token: &str) -> Result<(), AuthError> {
        if let Ok(claims) = self.signer.verify_ignoring_expiry(token) {
            if self.sessions.delete(&claims.sid).await? {
                debug!(session = %claims.sid, "removed expired session");
            }
        }
        Ok(())
    }

    async fn issue_session(&self, account: &Account) -> Result<AuthSession, AuthError> {
        let purged = self.sessions.delete_expired().await?;
        if purged > 0 {
            debug!(purged, "purged expired sessions");
        }

        let now = Utc::now();
        let record = SessionRecord {
            id: Uuid::new_v4().to_string(),
            user_id: account.id.clone(),
            created_at: now,
            expires_at: now + self.session_ttl,
        };
        self.sessions.create(&record).await?;

        let token = self.signer.sign(&SessionClaims::new(
            &account.id,
            &record.id,
            record.created_at,
            record.expires_at,
        ))?;

        debug!(account = %account.id, session = %record.id, "session issued");
        Ok(AuthSession {
            token,
            session_id: record.id,
            account: account.public(),
            expires_at: record.expires_at,
        })
    }
}

impl SessionExchange for Authenticator {
    type Session = AuthSession;

    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession, SignInError> {
        self.login_with_password(&credentials.email, &credentials.password)
            .await
            .map_err(|error| match error {
                AuthError::InvalidCredentials => SignInError::InvalidCredentials,
                other => SignInError::Unavailable(other.to_string()),
            })
    }
}

impl ProviderCatalog for Authenticator {
    async fn providers(&self) -> Result<ProviderMap, DiscoveryError> {
        Ok(self.provider_map())
    }
}
