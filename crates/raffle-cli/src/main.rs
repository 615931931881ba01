mod cmd;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "raffle",
    about = "Deploy or attach the raffle components, wire them, and drive a raffle",
    version,
    propagate_version = true
)]
struct Cli {
    /// Configuration file
    #[arg(long, short = 'c', global = true, env = "RAFFLE_CONFIG", default_value = raffle_core::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute the configured run (default)
    Run,

    /// Write a default configuration file
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the step plan and check phase preconditions without connecting
    Plan,

    /// Validate the configuration for common mistakes
    Validate,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => cmd::run::run(&cli.config, cli.json),
        Commands::Init { force } => cmd::init::run(&cli.config, force),
        Commands::Plan => cmd::plan::run(&cli.config, cli.json),
        Commands::Validate => cmd::validate::run(&cli.config, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
