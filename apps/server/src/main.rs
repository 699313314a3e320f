use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use launchpad_accounts::{RegistrationError, RegistrationRequest};
use launchpad_api::build_router;
use launchpad_config::load as load_config;
use launchpad_runtime::{shutdown_signal, telemetry, BackendServices};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "launchpad-server")]
#[command(about = "Launchpad account backend (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Apply database migrations and exit
    Migrate,
    /// Create a demo account
    Seed(SeedArgs),
}

#[derive(Args)]
struct SeedArgs {
    #[arg(long, default_value = "Demo User")]
    name: String,
    #[arg(long, default_value = "demo@example.com")]
    email: String,
    #[arg(long, default_value = "password123")]
    password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing().context("failed to initialise tracing")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::Migrate => migrate().await,
        Commands::Seed(args) => seed(args).await,
    }
}

async fn services() -> anyhow::Result<BackendServices> {
    let config = load_config().context("failed to load configuration")?;
    BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")
}

async fn run_server() -> anyhow::Result<()> {
    info!("starting Launchpad backend");

    let config = load_config().context("failed to load configuration")?;
    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let app = build_router(services.app_state());

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")?;

    services.db_pool.close().await;
    info!("backend shut down");
    Ok(())
}

async fn migrate() -> anyhow::Result<()> {
    // Initialisation already runs pending migrations.
    let services = services().await?;
    let applied = launchpad_database::MIGRATOR.iter().count();
    services.db_pool.close().await;

    println!("Database is up to date ({applied} migrations known)");
    Ok(())
}

async fn seed(args: SeedArgs) -> anyhow::Result<()> {
    let services = services().await?;
    let state = services.app_state();

    let request = RegistrationRequest::new(args.name, args.email.clone(), args.password);
    match state.registration().register(request).await {
        Ok(account) => {
            println!("Seeded account {} <{}>", account.id, account.email);
        }
        Err(RegistrationError::Conflict) => {
            println!("{} is already seeded", args.email);
        }
        Err(error) => return Err(error).context("failed to seed demo account"),
    }

    services.db_pool.close().await;
    Ok(())
}
