//! Pending OAuth authorizations.
//!
//! Each `state` handed to a provider is remembered together with the provider and
//! redirect URI it was issued for. A callback is accepted only if all three match
//! and the entry is younger than the TTL; the entry is removed on first use.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use launchpad_auth::OAuthProvider;
use rand::distributions::{Alphanumeric, DistString};
use tokio::sync::Mutex;
use tracing::debug;

const DEFAULT_TTL: Duration = Duration::from_secs(600);
const STATE_LEN: usize = 32;

struct Pending {
    provider: OAuthProvider,
    redirect_uri: String,
    issued_at: Instant,
}

#[derive(Clone)]
pub struct OAuthStateStore {
    pending: Arc<Mutex<HashMap<String, Pending>>>,
    ttl: Duration,
}

impl OAuthStateStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn issue(&self, provider: OAuthProvider, redirect_uri: &str) -> String {
        let state = Alphanumeric.sample_string(&mut rand::thread_rng(), STATE_LEN);

        let mut pending = self.pending.lock().await;
        self.evict_expired(&mut pending);
        pending.insert(
            state.clone(),
            Pending {
                provider,
                redirect_uri: redirect_uri.to_owned(),
                issued_at: Instant::now(),
            },
        );
        state
    }

    /// Redeem `state`. A mismatched provider or redirect URI still burns the entry.
    pub async fn consume(&self, state: &str, provider: OAuthProvider, redirect_uri: &str) -> bool {
        let mut pending = self.pending.lock().await;
        self.evict_expired(&mut pending);

        match pending.remove(state) {
            Some(entry) if entry.provider == provider && entry.redirect_uri == redirect_uri => true,
            Some(_) => {
                debug!(%provider, "oauth state presented for a different authorization");
                false
            }
            None => false,
        }
    }

    pub async fn pending_count(&self) -> usize {
        let mut pending = self.pending.lock().await;
        self.evict_expired(&mut pending);
        pending.len()
    }

    fn evict_expired(&self, pending: &mut HashMap<String, Pending>) {
        let ttl = self.ttl;
        pending.retain(|_, entry| entry.issued_at.elapsed() <= ttl);
    }
}

impl Default for OAuthStateStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    const CALLBACK: &str = "http://localhost:3000/callback";

    #[tokio::test]
    async fn state_is_redeemable_exactly_once() {
        let store = OAuthStateStore::default();
        let state = store.issue(OAuthProvider::GitHub, CALLBACK).await;

        assert_eq!(state.len(), STATE_LEN);
        assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(store.consume(&state, OAuthProvider::GitHub, CALLBACK).await);
        assert!(!store.consume(&state, OAuthProvider::GitHub, CALLBACK).await);
    }

    #[tokio::test]
    async fn state_is_bound_to_provider_and_redirect() {
        let store = OAuthStateStore::default();

        let state = store.issue(OAuthProvider::GitHub, CALLBACK).await;
        assert!(!store.consume(&state, OAuthProvider::Google, CALLBACK).await);
        // The failed attempt consumed it.
        assert!(!store.consume(&state, OAuthProvider::GitHub, CALLBACK).await);

        let state = store.issue(OAuthProvider::Google, CALLBACK).await;
        assert!(
            !store
                .consume(&state, OAuthProvider::Google, "http://evil.example/cb")
                .await
        );
    }

    #[tokio::test]
    async fn expired_states_are_rejected_and_evicted() {
        let store = OAuthStateStore::new(Duration::from_millis(10));
        let state = store.issue(OAuthProvider::GitHub, CALLBACK).await;

        sleep(Duration::from_millis(25)).await;

        assert!(!store.consume(&state, OAuthProvider::GitHub, CALLBACK).await);
        assert_eq!(store.pending_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_state_is_rejected() {
        let store = OAuthStateStore::default();
        assert!(!store.consume("never-issued", OAuthProvider::GitHub, CALLBACK).await);
    }
}
