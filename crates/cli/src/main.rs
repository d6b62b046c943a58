//! Bazaar CLI - Database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! bazaar-cli migrate
//!
//! # Create an admin
//! bazaar-cli user create -e admin@example.com -n "Ada Admin" -r admin -p 'correct horse'
//!
//! # Create a vendor with an approved store
//! bazaar-cli user create -e pots@example.com -n "Pat Potter" -r vendor -p '...' --store "Pat's Pots"
//!
//! # Change a role
//! bazaar-cli user set-role -e pots@example.com -r salesperson
//!
//! # Reset a forgotten password
//! bazaar-cli user set-password -e pots@example.com -p '...'
//!
//! # Load categories and banners
//! bazaar-cli seed -f seed.yaml
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bazaar-cli")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Load categories and banners from a YAML file
    Seed {
        /// Path to the YAML file
        #[arg(short, long)]
        file: String,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create an account with any role
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`customer`, `vendor`, `salesperson`, `admin`)
        #[arg(short, long, default_value = "customer")]
        role: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,

        /// Store name for vendors; the store is created already approved
        #[arg(long)]
        store: Option<String>,
    },
    /// Change an existing account's role
    SetRole {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// New role
        #[arg(short, long)]
        role: String,
    },
    /// Replace an account's password
    SetPassword {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// New password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                role,
                password,
                store,
            } => {
                commands::user::create(&email, &name, &role, &password, store.as_deref()).await?;
            }
            UserAction::SetRole { email, role } => {
                commands::user::set_role(&email, &role).await?;
            }
            UserAction::SetPassword { email, password } => {
                commands::user::set_password(&email, &password).await?;
            }
        },
        Commands::Seed { file } => commands::seed::run(&file).await?,
    }
    Ok(())
}
