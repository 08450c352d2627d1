use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use dartx::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for dartx::AppCommand {
    fn from(cmd: Commands) -> dartx::AppCommand {
        match cmd {
            Commands::Classify => dartx::AppCommand::Classify,
            Commands::Collect => dartx::AppCommand::Collect,
            Commands::Report => dartx::AppCommand::Report,
            Commands::Cache {
                command: CacheCommands::Clear,
            } => dartx::AppCommand::ClearCache,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Classify registry entities against the configured taxonomy
    Classify,
    /// Collect financial statements for the classified entities
    Collect,
    /// Display derived metrics and industry averages
    Report,
    /// Manage the fetch cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Purge every cached response
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => dartx::cli::setup::setup(),
        Some(cmd) => dartx::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
