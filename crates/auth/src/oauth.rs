//! OAuth authorization-code clients for the supported providers.

use std::fmt;
use std::str::FromStr;

use anyhow::Context;
use launchpad_config::OAuthClientConfig;
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse, TokenUrl,
};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::debug;

use crate::AuthError;

const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITHUB_USER_API: &str = "https://api.github.com/user";
const GITHUB_EMAILS_API: &str = "https://api.github.com/user/emails";

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_API: &str = "https://openidconnect.googleapis.com/v1/userinfo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OAuthProvider {
    GitHub,
    Google,
}

impl OAuthProvider {
    pub const ALL: [OAuthProvider; 2] = [OAuthProvider::GitHub, OAuthProvider::Google];

    pub fn id(self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::Google => "google",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::GitHub => "GitHub",
            Self::Google => "Google",
        }
    }

    fn endpoints(self) -> (&'static str, &'static str) {
        match self {
            Self::GitHub => (GITHUB_AUTHORIZE_URL, GITHUB_TOKEN_URL),
            Self::Google => (GOOGLE_AUTHORIZE_URL, GOOGLE_TOKEN_URL),
        }
    }

    fn scopes(self) -> &'static [&'static str] {
        match self {
            Self::GitHub => &["read:user", "user:email"],
            Self::Google => &["openid", "email", "profile"],
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for OAuthProvider {
    type Err = AuthError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "github" => Ok(Self::GitHub),
            "google" => Ok(Self::Google),
            _ => Err(AuthError::UnknownProvider(value.to_string())),
        }
    }
}

/// What a provider tells us about the person who signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthProfile {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub login: Option<String>,
}

impl OAuthProfile {
    /// Display name for a newly created account.
    pub fn display_name(&self, email: &str) -> String {
        self.name
            .as_deref()
            .or(self.login.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string())
    }
}

#[derive(Clone)]
pub struct OAuthClient {
    provider: OAuthProvider,
    client: BasicClient,
    http: reqwest::Client,
}

impl OAuthClient {
    /// `None` when the provider has no complete client credentials configured.
    pub fn from_config(
        provider: OAuthProvider,
        config: &OAuthClientConfig,
    ) -> Result<Option<Self>, AuthError> {
        let Some((client_id, client_secret)) = config.credentials() else {
            return Ok(None);
        };
        Self::new(provider, client_id, client_secret).map(Some)
    }

    pub fn new(
        provider: OAuthProvider,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Self, AuthError> {
        let (authorize_url, token_url) = provider.endpoints();

        let client = BasicClient::new(
            ClientId::new(client_id.to_string()),
            Some(ClientSecret::new(client_secret.to_string())),
            AuthUrl::new(authorize_url.to_string()).context("invalid authorize url")?,
            Some(TokenUrl::new(token_url.to_string()).context("invalid token url")?),
        )
        .set_auth_type(AuthType::RequestBody);

        let http = reqwest::Client::builder()
            .user_agent("launchpad-backend")
            .build()
            .context("failed to build oauth http client")?;

        Ok(Self {
            provider,
            client,
            http,
        })
    }

    pub fn authorize_url(&self, state: &str, redirect_uri: &str) -> anyhow::Result<String> {
        let redirect = RedirectUrl::new(redirect_uri.to_owned())
            .with_context(|| format!("invalid redirect uri for {} oauth", self.provider))?;

        let client = self.client.clone().set_redirect_uri(redirect);
        let mut request = client.authorize_url(|| CsrfToken::new(state.to_owned()));
        for scope in self.provider.scopes() {
            request = request.add_scope(Scope::new((*scope).to_string()));
        }

        let (url, _) = request.url();
        Ok(url.to_string())
    }

    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> anyhow::Result<OAuthProfile> {
        let redirect = RedirectUrl::new(redirect_uri.to_owned())
            .with_context(|| format!("invalid redirect uri for {} oauth", self.provider))?;

        let token_response = self
            .client
            .clone()
            .set_redirect_uri(redirect)
            .exchange_code(AuthorizationCode::new(code.to_owned()))
            .request_async(async_http_client)
            .await
            .with_context(|| format!("failed to exchange {} oauth code", self.provider))?;

        let access_token = token_response.access_token().secret();

        match self.provider {
            OAuthProvider::GitHub => self.github_profile(access_token).await,
            OAuthProvider::Google => self.google_profile(access_token).await,
        }
    }

    async fn github_profile(&self, access_token: &str) -> anyhow::Result<OAuthProfile> {
        let user: GithubUserResponse = self
            .http
            .get(GITHUB_USER_API)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .context("failed to call github user api")?
            .error_for_status()
            .context("github user api returned error")?
            .json()
            .await
            .context("failed to decode github user response")?;

        debug!(login = %user.login, id = user.id, "fetched github user profile");

        // Private emails are missing from /user and have to be listed separately.
        let email = match user.email {
            Some(email) => Some(email),
            None => self.github_primary_email(access_token).await?,
        };

        Ok(OAuthProfile {
            id: user.id.to_string(),
            email,
            name: user.name,
            login: Some(user.login),
        })
    }

    async fn github_primary_email(&self, access_token: &str) -> anyhow::Result<Option<String>> {
        let emails: Vec<GithubEmail> = self
            .http
            .get(GITHUB_EMAILS_API)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .context("failed to call github emails api")?
            .error_for_status()
            .context("github emails api returned error")?
            .json()
            .await
            .context("failed to decode github emails response")?;

        Ok(emails
            .into_iter()
            .find(|entry| entry.primary && entry.verified)
            .map(|entry| entry.email))
    }

    async fn google_profile(&self, access_token: &str) -> anyhow::Result<OAuthProfile> {
        let user: GoogleUserInfo = self
            .http
            .get(GOOGLE_USERINFO_API)
            .bearer_auth(access_token)
            .send()
            .await
            .context("failed to call google userinfo api")?
            .error_for_status()
            .context("google userinfo api returned error")?
            .json()
            .await
            .context("failed to decode google userinfo response")?;

        debug!(sub = %user.sub, "fetched google user profile");

        Ok(OAuthProfile {
            id: user.sub,
            email: user.email.filter(|_| user.email_verified.unwrap_or(false)),
            name: user.name,
            login: None,
        })
    }
}

impl fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthClient")
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct GithubUserResponse {
    id: i64,
    login: String,
    name: Option<String>,
    email: Option<String>,
}

#[derive(Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

#[derive(Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_ids_parse_case_insensitively() {
        assert_eq!("GitHub".parse::<OAuthProvider>().unwrap(), OAuthProvider::GitHub);
        assert_eq!("google".parse::<OAuthProvider>().unwrap(), OAuthProvider::Google);
        assert!(matches!(
            "gitlab".parse::<OAuthProvider>(),
            Err(AuthError::UnknownProvider(_))
        ));
    }

    #[test]
    fn authorize_url_carries_state_redirect_and_scopes() {
        let client = OAuthClient::new(OAuthProvider::Google, "client-id", "client-secret").unwrap();

        let url = client
            .authorize_url("state123", "http://localhost:3000/auth/callback")
            .unwrap();

        assert!(url.starts_with(GOOGLE_AUTHORIZE_URL));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("state=state123"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback"));
        assert!(url.contains("openid"));
    }

    #[test]
    fn incomplete_credentials_disable_the_provider() {
        let config = OAuthClientConfig {
            client_id: Some("id".into()),
            client_secret: None,
        };
        assert!(OAuthClient::from_config(OAuthProvider::GitHub, &config)
            .unwrap()
            .is_none());
    }

    #[test]
    fn display_name_falls_back_to_login_then_email() {
        let mut profile = OAuthProfile {
            id: "1".into(),
            email: Some("grace@example.com".into()),
            name: None,
            login: Some("ghopper".into()),
        };
        assert_eq!(profile.display_name("grace@example.com"), "ghopper");

        profile.login = None;
        assert_eq!(profile.display_name("grace@example.com"), "grace");

        profile.name = Some("Grace Hopper".into());
        assert_eq!(profile.display_name("grace@example.com"), "Grace Hopper");
    }
}
