//! Wayfarer CLI entry point.
//!
//! Commands:
//! - `chat`: interactive chat or single-message mode
//! - `seed`: load and apply the seed memory file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "wayfarer",
    about = "Wayfarer, a memory-augmented travel concierge agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, default_value = "wayfarer.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the travel concierge
    Chat {
        /// User id owning the session (history and memories are per user)
        #[arg(short, long, default_value = "default")]
        user: String,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Show tool activity while the agent works
        #[arg(long)]
        show_events: bool,
    },

    /// Validate the seed file and show what it would load
    Seed,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat {
            user,
            message,
            show_events,
        } => commands::chat::run(&cli.config, &user, message, show_events).await?,
        Commands::Seed => commands::seed::run(&cli.config).await?,
    }

    Ok(())
}
