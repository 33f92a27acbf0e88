//! Scantag CLI - pattern-based tagging bot for Wikipedia articles.

use anyhow::Result;
use clap::Parser;
use scantag_cli::commands::{self, ConfigCommand, RunOptions};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "scantag")]
#[command(about = "Scan articles for rule patterns and tag the ones that match", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Run the rules against one page, twice, instead of the corpus
    ///
    /// Edits made in this mode carry the sandbox marker in their summary.
    #[arg(long, value_name = "TITLE", conflicts_with = "sandbox")]
    test_page: Option<String>,

    /// Regenerate the sandbox page instead of tagging
    #[arg(long)]
    sandbox: bool,

    /// Keep running full corpus passes, reloading the rules before each one
    #[arg(long, conflicts_with_all = ["test_page", "sandbox"])]
    continuous: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Manage scantag configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

fn init_logging(verbose: u8) {
    let default_level = if verbose > 0 { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(verbose > 1))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Command::Config { command }) => {
            commands::handle_config_command(command, cli.config.as_deref())
        }
        None => commands::run(RunOptions {
            config: cli.config,
            test_page: cli.test_page,
            sandbox: cli.sandbox,
            continuous: cli.continuous,
        }),
    }
}
