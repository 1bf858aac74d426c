//! Round Again CLI - Migrations, sample data and reminder tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! ra-cli migrate
//!
//! # Insert the bundled sample contacts (or your own YAML file)
//! ra-cli seed
//! ra-cli seed --file my-contacts.yaml
//!
//! # Run the reminder job once, sending email if anyone is due
//! ra-cli reminders run
//!
//! # Show who would be reminded right now, without sending
//! ra-cli reminders preview
//!
//! # Check SMTP settings
//! ra-cli email test --to me@example.com
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ra-cli")]
#[command(author, version, about = "Round Again CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert sample contacts and interactions
    Seed {
        /// YAML file to load instead of the bundled samples
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Run or preview the reminder job
    Reminders {
        #[command(subcommand)]
        action: RemindersAction,
    },
    /// Email utilities
    Email {
        #[command(subcommand)]
        action: EmailAction,
    },
}

#[derive(Subcommand)]
enum RemindersAction {
    /// Run the job once (sends email if anyone is due)
    Run,
    /// Log the current selection without sending anything
    Preview,
}

#[derive(Subcommand)]
enum EmailAction {
    /// Send a test email
    Test {
        /// Recipient (defaults to `USER_EMAIL`)
        #[arg(short, long)]
        to: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
        Commands::Seed { file } => commands::seed::run(file.as_deref()).await?,
        Commands::Reminders { action } => match action {
            RemindersAction::Run => commands::reminders::run().await?,
            RemindersAction::Preview => commands::reminders::preview().await?,
        },
        Commands::Email { action } => match action {
            EmailAction::Test { to } => commands::email::test(to.as_deref()).await?,
        },
    }
    Ok(())
}
