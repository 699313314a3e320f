//! Sign-in provider discovery.
//!
//! The auth layer reports every configured sign-in method as a loosely typed
//! `{ id, name, type }` record keyed by provider id. [`Provider`] narrows those
//! records to the kinds the sign-in view knows how to render, and
//! [`SignInOptions`] partitions them into the credentials form and OAuth buttons.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Credentials,
    #[serde(rename = "oauth")]
    OAuth,
    /// Anything the auth layer may report that we do not render (email links, webauthn).
    #[serde(other)]
    Unsupported,
}

/// One entry of the provider discovery response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ProviderType,
}

impl ProviderDescriptor {
    pub fn credentials() -> Self {
        Self {
            id: "credentials".to_string(),
            name: "Credentials".to_string(),
            kind: ProviderType::Credentials,
        }
    }

    pub fn oauth(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: ProviderType::OAuth,
        }
    }
}

/// Provider id to descriptor. Ordered so discovery output is stable.
pub type ProviderMap = BTreeMap<String, ProviderDescriptor>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Provider {
    Credentials,
    #[serde(rename = "oauth")]
    OAuth { id: String, name: String },
}

impl Provider {
    pub fn from_descriptor(descriptor: &ProviderDescriptor) -> Option<Self> {
        match descriptor.kind {
            ProviderType::Credentials => Some(Self::Credentials),
            ProviderType::OAuth => Some(Self::OAuth {
                id: descriptor.id.clone(),
                name: descriptor.name.clone(),
            }),
            ProviderType::Unsupported => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("provider discovery unavailable: {0}")]
    Unavailable(String),

    #[error("provider discovery returned an unreadable response: {0}")]
    Malformed(String),
}

/// Read-only source of the configured sign-in methods.
#[allow(async_fn_in_trait)]
pub trait ProviderCatalog {
    async fn providers(&self) -> Result<ProviderMap, DiscoveryError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthButton {
    pub id: String,
    pub name: String,
}

/// What the sign-in and registration views render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInOptions {
    pub oauth: Vec<OAuthButton>,
}

impl SignInOptions {
    /// The credentials form never depends on discovery.
    pub fn credentials_form(&self) -> bool {
        true
    }

    pub fn has_oauth(&self) -> bool {
        !self.oauth.is_empty()
    }

    pub fn from_providers(providers: &ProviderMap) -> Self {
        let oauth = providers
            .values()
            .filter_map(Provider::from_descriptor)
            .filter_map(|provider| match provider {
                Provider::Credentials => None,
                Provider::OAuth { id, name } => Some(OAuthButton { id, name }),
            })
            .collect();

        Self { oauth }
    }
}

/// Fetch the provider list once and partition it. A failed fetch degrades to the
/// credentials form alone.
pub async fn discover<C>(catalog: &C) -> SignInOptions
where
    C: ProviderCatalog,
{
    match catalog.providers().await {
        Ok(providers) => {
            debug!(count = providers.len(), "discovered sign-in providers");
            SignInOptions::from_providers(&providers)
        }
        Err(error) => {
            warn!(%error, "provider discovery failed, showing credentials only");
            SignInOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StaticCatalog(Result<ProviderMap, String>);

    impl ProviderCatalog for StaticCatalog {
        async fn providers(&self) -> Result<ProviderMap, DiscoveryError> {
            self.0.clone().map_err(DiscoveryError::Unavailable)
        }
    }

    fn map(descriptors: Vec<ProviderDescriptor>) -> ProviderMap {
        descriptors
            .into_iter()
            .map(|descriptor| (descriptor.id.clone(), descriptor))
            .collect()
    }

    #[tokio::test]
    async fn credentials_only_renders_no_buttons() {
        let catalog = StaticCatalog(Ok(map(vec![ProviderDescriptor::credentials()])));

        let options = discover(&catalog).await;

        assert!(options.credentials_form());
        assert!(!options.has_oauth());
    }

    #[tokio::test]
    async fn oauth_providers_become_buttons_in_id_order() {
        let catalog = StaticCatalog(Ok(map(vec![
            ProviderDescriptor::credentials(),
            ProviderDescriptor::oauth("google", "Google"),
            ProviderDescriptor::oauth("github", "GitHub"),
        ])));

        let options = discover(&catalog).await;

        assert_eq!(
            options.oauth,
            vec![
                OAuthButton {
                    id: "github".into(),
                    name: "GitHub".into()
                },
                OAuthButton {
                    id: "google".into(),
                    name: "Google".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn failed_or_empty_discovery_keeps_the_credentials_form() {
        let failing = discover(&StaticCatalog(Err("timeout".into()))).await;
        let empty = discover(&StaticCatalog(Ok(ProviderMap::new()))).await;

        for options in [failing, empty] {
            assert!(options.credentials_form());
            assert!(!options.has_oauth());
        }
    }

    #[test]
    fn unknown_provider_types_are_skipped() {
        let providers: ProviderMap = serde_json::from_value(json!({
            "email": { "id": "email", "name": "Email", "type": "email" },
            "github": { "id": "github", "name": "GitHub", "type": "oauth" }
        }))
        .unwrap();

        assert_eq!(providers["email"].kind, ProviderType::Unsupported);
        assert_eq!(Provider::from_descriptor(&providers["email"]), None);
        assert_eq!(SignInOptions::from_providers(&providers).oauth.len(), 1);
    }

    #[test]
    fn descriptor_serializes_type_field() {
        let value = serde_json::to_value(ProviderDescriptor::credentials()).unwrap();
        assert_eq!(
            value,
            json!({ "id": "credentials", "name": "Credentials", "type": "credentials" })
        );
    }
}
