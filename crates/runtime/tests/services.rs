use std::path::Path;

use anyhow::{Context, Result};
use launchpad_accounts::RegistrationRequest;
use launchpad_config::AppConfig;
use launchpad_runtime::BackendServices;
use tempfile::TempDir;

fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}", path.to_string_lossy())
}

fn build_config(database_url: String, max_connections: u32) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = database_url;
    config.database.max_connections = max_connections;
    config
}

async fn initialise(config: &AppConfig) -> Result<BackendServices> {
    BackendServices::initialise(config)
        .await
        .context("failed to initialise backend services")
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_runs_migrations() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("runtime/init.db");
    let config = build_config(sqlite_url(&db_path), 4);

    let services = initialise(&config).await?;
    let table: String = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'users'",
    )
    .fetch_one(&services.db_pool)
    .await?;

    assert_eq!("users", table);
    assert!(services.authenticator.enabled_providers().is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_creates_sqlite_directory_if_missing() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_dir = temp_dir.path().join("nested");
    let config = build_config(sqlite_url(&db_dir.join("prepared.db")), 2);

    assert!(!db_dir.exists());

    let services = initialise(&config).await?;
    assert!(db_dir.exists(), "database directory should be created");
    drop(services);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_enables_configured_oauth_providers() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut config = build_config(sqlite_url(&temp_dir.path().join("oauth.db")), 1);
    config.auth.google.client_id = Some("google-id".into());
    config.auth.google.client_secret = Some("google-secret".into());

    let services = initialise(&config).await?;
    let providers = services.authenticator.provider_map();

    assert!(providers.contains_key("credentials"));
    assert!(providers.contains_key("google"));
    assert!(!providers.contains_key("github"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn app_state_shares_the_services_database() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = build_config(sqlite_url(&temp_dir.path().join("state.db")), 2);

    let services = initialise(&config).await?;
    let state = services.app_state();
    state
        .registration()
        .register(RegistrationRequest::new(
            "Ada",
            "ada@example.com",
            "secret1",
        ))
        .await?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&services.db_pool)
        .await?;
    assert_eq!(count, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_fails_for_unreachable_database() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let file = temp_dir.path().join("not-a-dir");
    std::fs::write(&file, b"occupied")?;
    let config = build_config(sqlite_url(&file.join("db.sqlite")), 1);

    let error = match BackendServices::initialise(&config).await {
        Ok(_) => panic!("expected initialisation to fail"),
        Err(error) => error,
    };
    assert!(format!("{error:?}").contains("failed to prepare database"));
    Ok(())
}
