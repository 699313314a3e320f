use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use launchpad_accounts::{
    discover, BootstrapOutcome, Credentials, RedirectTargets, RegistrationForm, SessionExchange,
    SignupFlow,
};
use tracing_subscriber::EnvFilter;

mod client;

use client::ApiClient;

#[derive(Parser)]
#[command(name = "launchpad")]
#[command(about = "Sign up and sign in against a Launchpad backend")]
#[command(version)]
struct Cli {
    #[arg(long, env = "LAUNCHPAD_API_URL", default_value = "http://127.0.0.1:7070")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sign-in methods the backend offers
    Providers,
    /// Register a new account and sign it in
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "LAUNCHPAD_PASSWORD", hide_env_values = true)]
        password: String,
        /// Defaults to `--password`
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Sign in with email and password and print the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "LAUNCHPAD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show the account behind a session token
    Whoami {
        #[arg(long, env = "LAUNCHPAD_TOKEN", hide_env_values = true)]
        token: String,
    },
    /// Revoke a session token
    Logout {
        #[arg(long, env = "LAUNCHPAD_TOKEN", hide_env_values = true)]
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = ApiClient::new(cli.api_url);

    match cli.command {
        Commands::Providers => providers(&client).await,
        Commands::Signup {
            name,
            email,
            password,
            confirm_password,
        } => {
            let form = RegistrationForm {
                name,
                email,
                confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                password,
            };
            signup(client, form).await
        }
        Commands::Login { email, password } => login(&client, email, password).await,
        Commands::Whoami { token } => whoami(&client, &token).await,
        Commands::Logout { token } => {
            client.logout(&token).await?;
            println!("Signed out");
            Ok(())
        }
    }
}

async fn providers(client: &ApiClient) -> Result<()> {
    let options = discover(client).await;

    if options.credentials_form() {
        println!("- Email and password");
    }
    for button in &options.oauth {
        println!("- {} ({})", button.name, button.id);
    }
    if !options.has_oauth() {
        println!("No OAuth providers configured");
    }
    Ok(())
}

async fn signup(client: ApiClient, form: RegistrationForm) -> Result<()> {
    let flow = SignupFlow::new(client.clone(), client, RedirectTargets::default());

    let outcome = match flow.submit_form(form).await {
        Ok(outcome) => outcome,
        Err(error) => {
            anyhow::bail!("{}", error.user_message());
        }
    };

    println!(
        "Created account {} <{}>",
        outcome.account.id, outcome.account.email
    );

    match outcome.session {
        BootstrapOutcome::Established {
            session,
            redirect_to,
        } => {
            println!("Signed in, continue at {redirect_to}");
            println!("Token: {}", session.token);
        }
        BootstrapOutcome::SignInRequired {
            redirect_to,
            message,
        } => {
            println!("{message}");
            println!("Sign in at {redirect_to}");
        }
    }
    Ok(())
}

async fn login(client: &ApiClient, email: String, password: String) -> Result<()> {
    let session = client
        .sign_in(&Credentials::new(email, password))
        .await
        .context("Sign-in failed")?;

    println!(
        "Signed in as {} <{}> until {}",
        session.account.name,
        session.account.email,
        session.expires_at.to_rfc3339()
    );
    println!("Token: {}", session.token);
    Ok(())
}

async fn whoami(client: &ApiClient, token: &str) -> Result<()> {
    let session = client.whoami(token).await?;

    println!(
        "{} <{}> (id {}), session valid until {}",
        session.account.name,
        session.account.email,
        session.account.id,
        session.expires_at.to_rfc3339()
    );
    Ok(())
}
