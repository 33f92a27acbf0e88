use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use scantag_config::{ConfigManager, ScantagConfig};
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a default config file to ~/.config/scantag/config.toml
    Init,

    /// Show config file path
    Path,

    /// Validate config file
    Validate,
}

pub fn handle_config_command(cmd: ConfigCommand, config: Option<&Path>) -> Result<()> {
    let runtime = Runtime::new().context("Failed to create tokio runtime")?;

    runtime.block_on(async {
        match cmd {
            ConfigCommand::Init => init_config(config).await,
            ConfigCommand::Path => show_config_path(config),
            ConfigCommand::Validate => validate_config(config).await,
        }
    })
}

fn resolve_path(config: Option<&Path>) -> Result<PathBuf> {
    match config {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(ConfigManager::config_path()?),
    }
}

/// Load the config from `--config` or the default location
pub async fn load_config(config: Option<&Path>) -> Result<ScantagConfig> {
    let path = resolve_path(config)?;
    let manager = ConfigManager::load_from(&path)
        .await
        .with_context(|| {
            format!(
                "Config at {} not found or invalid. Run 'scantag config init' first.",
                path.display()
            )
        })?;
    Ok(manager.into_config())
}

async fn init_config(config: Option<&Path>) -> Result<()> {
    let config_path = resolve_path(config)?;

    if config_path.exists() {
        println!("Config already exists at: {}", config_path.display());
        println!("To reinitialize, please delete the existing config first.");
        return Ok(());
    }

    ConfigManager::init_at(&config_path).await?;
    println!("{} Initialized config at: {}", "✓".green(), config_path.display());
    println!("  Set wiki.username and a rule source, then put the bot password");
    println!("  in wiki.password or {}.", scantag_config::PASSWORD_ENV);
    Ok(())
}

fn show_config_path(config: Option<&Path>) -> Result<()> {
    println!("{}", resolve_path(config)?.display());
    Ok(())
}

async fn validate_config(config: Option<&Path>) -> Result<()> {
    let config = load_config(config).await?;

    println!("{} Config is valid", "✓".green());
    println!("  Version: {}", config.version);
    println!("  API: {}", config.wiki.api_url);
    println!("  User: {}", config.wiki.username);
    match (&config.task.rules_page_id, &config.task.rules_path) {
        (Some(id), _) => println!("  Rules: page id {}", id),
        (None, Some(path)) => println!("  Rules: {}", path.display()),
        (None, None) => {}
    }
    println!("  Corpus: {}", config.task.corpus_path.display());
    println!("  Batch size: {}", config.task.batch_size);
    if let Some(sandbox) = &config.sandbox {
        println!(
            "  Sandbox: rules page id {}, sandbox page id {}",
            sandbox.rules_page_id, sandbox.page_id
        );
    }

    if config.wiki.password().is_none() {
        println!(
            "\n{} No bot password set; tagging runs will fail to log in.",
            "Warning:".yellow()
        );
    }

    if config.task.rules_page_id.is_none() {
        if let Some(path) = &config.task.rules_path {
            if !path.exists() {
                println!(
                    "\n{} Rule source {} does not exist.",
                    "Warning:".yellow(),
                    path.display()
                );
            }
        }
    }

    if !config.task.corpus_path.exists() {
        println!(
            "\n{} Corpus {} does not exist.",
            "Warning:".yellow(),
            config.task.corpus_path.display()
        );
    }

    Ok(())
}
