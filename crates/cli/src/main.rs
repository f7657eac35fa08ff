//! Back office CLI - interactive shell and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Open the interactive shell (default)
//! bo-cli
//! bo-cli --api-url http://backoffice.internal:8081/api shell
//!
//! # Run database migrations
//! bo-cli migrate
//!
//! # Create an admin account
//! bo-cli admin create -u root -e root@example.com
//! ```
//!
//! # Commands
//!
//! - `shell` - Interactive client for products and accounts
//! - `migrate` - Run database migrations
//! - `admin create` - Create an admin account through the API

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::{self, IsTerminal};

use clap::{Parser, Subcommand};
use secrecy::SecretString;

use backoffice_cli::{ApiClient, DEFAULT_API_URL, Shell};

mod commands;

#[derive(Parser)]
#[command(name = "bo-cli")]
#[command(author, version, about = "Back office client shell and tools")]
struct Cli {
    /// Root URL of the REST API
    #[arg(long, global = true, env = "BACKOFFICE_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive shell
    Shell,
    /// Run database migrations
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Username
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(long, env = "BACKOFFICE_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file if present (ignore errors if not found)
    let _ = dotenvy::dotenv();

    // Logs go to stderr so they never mix with shell output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "backoffice_cli=warn,bo_cli=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            let client = ApiClient::new(&cli.api_url)?;
            let stdin = io::stdin();
            let interactive = stdin.is_terminal();
            let mut shell = Shell::new(client, stdin.lock(), io::stdout().lock());
            if interactive {
                shell = shell.with_hidden_passwords();
            }
            shell.run().await?;
        }
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                username,
                email,
                password,
            } => {
                let client = ApiClient::new(&cli.api_url)?;
                let password = SecretString::from(password);
                commands::admin::create(&client, &username, &email, &password).await?;
            }
        },
    }
    Ok(())
}
