//! Sous CLI — the main entry point.
//!
//! Commands:
//! - `chat`    — Interactive session (the default)
//! - `tools`   — Print the tool catalog as JSON Schema
//! - `config`  — Show the effective configuration or a starter file

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

mod commands;
mod render;

#[derive(Parser)]
#[command(
    name = "sous",
    about = "Sous — an interactive coding agent for your terminal",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    overrides: Overrides,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Settings that override the config file and environment.
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Config file to load instead of ~/.sous/config.toml
    #[arg(long, global = true, env = "SOUS_CONFIG")]
    config: Option<PathBuf>,

    /// Model name
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible endpoint
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Compact once the conversation holds more than this many messages
    #[arg(long, global = true)]
    compaction_threshold: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the agent (default)
    Chat,

    /// Print the built-in tool catalog
    Tools,

    /// Show configuration
    Config {
        /// Print a starter config file instead of the effective configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing; stdout belongs to the conversation
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let config = commands::load_config(&cli.overrides)?;
            if commands::chat::run(config).await? == commands::chat::SessionEnd::Interrupted {
                std::process::exit(130);
            }
        }
        Commands::Tools => commands::tools::run()?,
        Commands::Config { default } => commands::config_cmd::run(&cli.overrides, default)?,
    }

    Ok(())
}
