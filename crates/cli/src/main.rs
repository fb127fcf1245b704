//! Assurance AI CLI — the main entry point.
//!
//! Works on event captures exported from an Assurance session (a JSON array
//! of events, most recent first unless `--oldest-first` is given).
//!
//! Commands:
//! - `extensions` — List the registered extensions found in a capture
//! - `select`     — Print the events matching a descriptor
//! - `validate`   — Run the validation pipeline as a dry run
//! - `ask`        — Build the prompt for a free-text validation request
//! - `config`     — Show, locate or check the configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod dry_run;

#[derive(Parser)]
#[command(
    name = "assurance-ai",
    about = "Validate captured SDK events against schemas",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.assurance-ai/config.toml)
    #[arg(short, long, global = true, env = "ASSURANCE_AI_CONFIG")]
    config: Option<PathBuf>,
}

/// Where the events come from.
#[derive(clap::Args)]
struct Capture {
    /// JSON array of captured events
    #[arg(short, long)]
    events: PathBuf,

    /// The capture lists events oldest first
    #[arg(long)]
    oldest_first: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered extensions from the latest hub shared state
    Extensions {
        #[command(flatten)]
        capture: Capture,
    },

    /// Print the most recent events matching a type and source
    Select {
        #[command(flatten)]
        capture: Capture,

        /// ACPExtensionEventType
        #[arg(long = "type")]
        event_type: String,

        /// ACPExtensionEventSource
        #[arg(long)]
        source: String,

        /// ACPExtensionEventName (any name when omitted)
        #[arg(long)]
        name: Option<String>,

        /// Maximum events to print (default 10)
        #[arg(long)]
        count: Option<i64>,
    },

    /// Validate every configured extension without calling a model
    Validate {
        #[command(flatten)]
        capture: Capture,

        /// Print the prepared plans as JSON instead of the report
        #[arg(long)]
        plan: bool,

        /// Include each rendered prompt in the report
        #[arg(long, conflicts_with = "plan")]
        echo: bool,
    },

    /// Build the prompt for a free-text validation request
    Ask {
        #[command(flatten)]
        capture: Capture,

        /// What to validate
        question: String,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Check the configuration and schema store
    Validate,
    /// Print a default config file
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Extensions { capture } => {
            commands::extensions::run(&capture.events, capture.oldest_first, config_path).await?
        }
        Commands::Select {
            capture,
            event_type,
            source,
            name,
            count,
        } => {
            let mut descriptor = assurance_core::MatchDescriptor::new(event_type, source);
            descriptor.name = name;
            descriptor.count = count;
            commands::select::run(&capture.events, capture.oldest_first, &descriptor, config_path).await?
        }
        Commands::Validate { capture, plan, echo } => {
            commands::validate::run(&capture.events, capture.oldest_first, plan, echo, config_path)
                .await?
        }
        Commands::Ask { capture, question } => {
            commands::ask::run(&capture.events, capture.oldest_first, &question, config_path).await?
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(config_path).await?,
            ConfigAction::Path => commands::config_cmd::path(config_path).await?,
            ConfigAction::Validate => commands::config_cmd::validate(config_path).await?,
            ConfigAction::Init => commands::config_cmd::init().await?,
        },
    }

    Ok(())
}
