//! HTTP client for the account API.
//!
//! [`ApiClient`] plays the same roles the server-side components do, so the
//! shared signup flow runs unchanged against a remote backend.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use launchpad_accounts::{
    AccountRegistrar, Credentials, DiscoveryError, ProviderCatalog, ProviderMap, PublicAccount,
    RegistrationError, RegistrationRequest, SessionExchange, SignInError, ValidationError,
};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSession {
    pub token: String,
    pub account: PublicAccount,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CurrentSession {
    pub account: PublicAccount,
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct AccountEnvelope {
    account: PublicAccount,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn whoami(&self, token: &str) -> Result<CurrentSession> {
        let response = self
            .client
            .get(self.url("/api/auth/session"))
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to reach session endpoint")?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let message = error_message(response).await;
            return Err(anyhow::anyhow!("Session lookup failed ({status}): {message}"));
        }

        response
            .json()
            .await
            .context("Failed to parse session response")
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url("/api/auth/logout"))
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to reach logout endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let message = error_message(response).await;
            return Err(anyhow::anyhow!("Logout failed ({status}): {message}"));
        }
        Ok(())
    }
}

impl AccountRegistrar for ApiClient {
    async fn register_account(
        &self,
        request: RegistrationRequest,
    ) -> Result<PublicAccount, RegistrationError> {
        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&request)
            .send()
            .await
            .map_err(|error| RegistrationError::internal(error.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let message = error_message(response).await;
            return Err(registration_error(status, message));
        }

        response
            .json::<AccountEnvelope>()
            .await
            .map(|envelope| envelope.account)
            .map_err(|error| RegistrationError::internal(error.to_string()))
    }
}

impl SessionExchange for ApiClient {
    type Session = RemoteSession;

    async fn sign_in(&self, credentials: &Credentials) -> Result<RemoteSession, SignInError> {
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&LoginBody {
                email: &credentials.email,
                password: &credentials.password,
            })
            .send()
            .await
            .map_err(|error| SignInError::Unavailable(error.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json()
                .await
                .map_err(|error| SignInError::Unavailable(error.to_string())),
            StatusCode::UNAUTHORIZED => Err(SignInError::InvalidCredentials),
            status => {
                let message = error_message(response).await;
                Err(SignInError::Unavailable(format!("{status}: {message}")))
            }
        }
    }
}

impl ProviderCatalog for ApiClient {
    async fn providers(&self) -> Result<ProviderMap, DiscoveryError> {
        let response = self
            .client
            .get(self.url("/api/auth/providers"))
            .send()
            .await
            .map_err(|error| DiscoveryError::Unavailable(error.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(DiscoveryError::Unavailable(response.status().to_string()));
        }

        let body = response
            .text()
            .await
            .map_err(|error| DiscoveryError::Unavailable(error.to_string()))?;
        parse_providers(&body)
    }
}

async fn error_message(response: Response) -> String {
    let text = response.text().await.unwrap_or_default();
    parse_error_message(&text)
}

fn parse_error_message(text: &str) -> String {
    serde_json::from_str::<ErrorBody>(text)
        .map(|body| body.error)
        .unwrap_or_else(|_| text.trim().to_string())
}

/// Translate a failed registration response back into the shared error type.
fn registration_error(status: StatusCode, message: String) -> RegistrationError {
    debug!(%status, "registration rejected by server");
    match status {
        StatusCode::BAD_REQUEST => ValidationError::Rejected(message).into(),
        StatusCode::CONFLICT => RegistrationError::Conflict,
        _ => RegistrationError::internal(format!("{status}: {message}")),
    }
}

fn parse_providers(body: &str) -> Result<ProviderMap, DiscoveryError> {
    serde_json::from_str(body).map_err(|error| DiscoveryError::Malformed(error.to_string()))
}
