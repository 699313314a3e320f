use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "launchpad.toml",
    "config/launchpad.toml",
    "crates/config/launchpad.toml",
    "../launchpad.toml",
    "../config/launchpad.toml",
];

/// Secret used when nothing is configured. Good enough for local development only.
pub const DEVELOPMENT_SESSION_SECRET: &str = "launchpad-development-secret-change-me-now";

/// Minimum accepted length, in bytes, of `auth.session_secret`.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 7070,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://launchpad.db".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_session_secret")]
    pub session_secret: String,
    #[serde(default = "AuthConfig::default_session_ttl")]
    pub session_ttl_seconds: u64,
    #[serde(default = "AuthConfig::default_landing_path")]
    pub landing_path: String,
    #[serde(default = "AuthConfig::default_sign_in_path")]
    pub sign_in_path: String,
    #[serde(default)]
    pub github: OAuthClientConfig,
    #[serde(default)]
    pub google: OAuthClientConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: Self::default_session_secret(),
            session_ttl_seconds: Self::default_session_ttl(),
            landing_path: Self::default_landing_path(),
            sign_in_path: Self::default_sign_in_path(),
            github: OAuthClientConfig::default(),
            google: OAuthClientConfig::default(),
        }
    }
}

impl AuthConfig {
    fn default_session_secret() -> String {
        DEVELOPMENT_SESSION_SECRET.to_string()
    }

    const fn default_session_ttl() -> u64 {
        86_400
    }

    fn default_landing_path() -> String {
        "/".to_string()
    }

    fn default_sign_in_path() -> String {
        "/login".to_string()
    }

    pub fn uses_development_secret(&self) -> bool {
        self.session_secret == DEVELOPMENT_SESSION_SECRET
    }
}

// Hand-written so the session secret and OAuth secrets never end up in logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("session_secret", &"<redacted>")
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("landing_path", &self.landing_path)
            .field("sign_in_path", &self.sign_in_path)
            .field("github", &self.github)
            .field("google", &self.google)
            .finish()
    }
}

/// Client credentials for one OAuth provider. The provider is enabled only when
/// both values are present.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct OAuthClientConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl OAuthClientConfig {
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Some((id, secret)),
            _ => None,
        }
    }
}

impl std::fmt::Debug for OAuthClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClientConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use launchpad_config::load;
///
/// std::env::remove_var("LAUNCHPAD_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let db_max = i64::from(defaults.database.max_connections);
    let session_ttl = i64::try_from(defaults.auth.session_ttl_seconds).unwrap_or(i64::MAX);

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default("database.max_connections", db_max)?
        .set_default("auth.session_secret", defaults.auth.session_secret.clone())?
        .set_default("auth.session_ttl_seconds", session_ttl)?
        .set_default("auth.landing_path", defaults.auth.landing_path.clone())?
        .set_default("auth.sign_in_path", defaults.auth.sign_in_path.clone())?;

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("LAUNCHPAD_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via LAUNCHPAD_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(config::Environment::with_prefix("LAUNCHPAD").separator("__"));

    if let Ok(url) = std::env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", url)?;
    }

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.auth.session_ttl_seconds > i64::MAX as u64 {
        config.auth.session_ttl_seconds = i64::MAX as u64;
    }

    validate(&config)?;

    debug!(?config, "loaded backend configuration");
    Ok(config)
}

fn validate(config: &AppConfig) -> anyhow::Result<()> {
    if config.auth.session_secret.len() < MIN_SESSION_SECRET_LEN {
        bail!(
            "auth.session_secret must be at least {MIN_SESSION_SECRET_LEN} bytes long"
        );
    }

    if config.auth.uses_development_secret() {
        warn!("using the development session secret; set LAUNCHPAD__AUTH__SESSION_SECRET");
    }

    if config.auth.session_ttl_seconds == 0 {
        bail!("auth.session_ttl_seconds must be greater than zero");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oauth_credentials_require_both_values() {
        let mut github = OAuthClientConfig::default();
        assert!(github.credentials().is_none());

        github.client_id = Some("id".into());
        assert!(github.credentials().is_none());

        github.client_secret = Some(String::new());
        assert!(github.credentials().is_none());

        github.client_secret = Some("secret".into());
        assert_eq!(github.credentials(), Some(("id", "secret")));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut auth = AuthConfig::default();
        auth.github.client_secret = Some("super-secret-value".into());

        let rendered = format!("{auth:?}");
        assert!(!rendered.contains(DEVELOPMENT_SESSION_SECRET));
        assert!(!rendered.contains("super-secret-value"));
    }

    #[test]
    fn validate_rejects_short_secret() {
        let mut config = AppConfig::default();
        config.auth.session_secret = "short".into();
        assert!(validate(&config).is_err());
    }
}
