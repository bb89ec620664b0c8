//! Parley CLI: the main entry point.
//!
//! Commands:
//! - `chat`    : interactive text/voice session, or a single message (default)
//! - `onboard` : write a default config
//! - `doctor`  : diagnose config, credentials, voice and provider reachability

use clap::{Parser, Subcommand};
use parley_config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "parley",
    about = "Parley: a command-line conversational assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Talk to the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Start in voice mode when it is available
        #[arg(long)]
        voice: bool,
    },

    /// Create ~/.parley and a default config.toml
    Onboard,

    /// Diagnose configuration and environment
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    // Initialize tracing
    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        config
            .as_ref()
            .map(|c| c.log_level.clone())
            .unwrap_or_else(|_| "info".into())
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let command = cli.command.unwrap_or(Commands::Chat {
        message: None,
        voice: false,
    });

    match command {
        Commands::Chat { message, voice } => commands::chat::run(config, message, voice).await?,
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Doctor => commands::doctor::run(config).await?,
    }

    Ok(())
}
