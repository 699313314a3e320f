use anyhow::{Context, Result};
use launchpad_api::AppState;
use launchpad_auth::Authenticator;
use launchpad_config::AppConfig;
use launchpad_database::initialize_database;
use sqlx::SqlitePool;
use tracing::{info, warn};

pub mod telemetry {
    use anyhow::Result;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_env_filter(env_filter)
            .with_target(false)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Everything the HTTP layer and the admin commands need, wired from one config.
#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub authenticator: Authenticator,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = initialize_database(&config.database)
            .await
            .context("failed to prepare database")?;

        let authenticator = Authenticator::new(db_pool.clone(), &config.auth)
            .context("failed to build authenticator")?;

        let providers = authenticator.enabled_providers();
        info!(oauth = ?providers, "authenticator ready");

        Ok(Self {
            db_pool,
            authenticator,
        })
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(self.authenticator.clone())
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
