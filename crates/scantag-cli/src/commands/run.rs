//! Tagging and sandbox runs.

use crate::commands::config::load_config;
use crate::display;
use anyhow::{bail, Context, Result};
use scantag_config::{ScantagConfig, PASSWORD_ENV};
use scantag_core::{
    BatchDriver, EditSubmitter, RuleSnapshot, RuleSource, RunStats, SandboxReport,
    SubmitterOptions,
};
use scantag_rules::{BannerRecognizer, EvaluationOptions};
use scantag_wiki::{ClientOptions, DocumentService, WikiClient};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::info;

/// Options for a run, from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config: Option<PathBuf>,
    pub test_page: Option<String>,
    pub sandbox: bool,
    pub continuous: bool,
}

/// Runs the selected mode to completion.
pub fn run(options: RunOptions) -> Result<()> {
    let runtime = Runtime::new().context("Failed to create tokio runtime")?;
    runtime.block_on(run_async(options))
}

async fn run_async(options: RunOptions) -> Result<()> {
    let config = load_config(options.config.as_deref()).await?;
    let service = connect(&config).await?;

    let banners = BannerRecognizer::new(&config.banners.extra_templates)
        .context("Invalid banners.extra_templates")?;
    let evaluation = EvaluationOptions {
        bot_username: config.wiki.bot_name().to_string(),
        guard_suffix: config.task.guard_suffix,
    };

    if options.sandbox {
        return run_sandbox(&config, service, banners, evaluation).await;
    }

    let source = RuleSource::from_settings(&config.task)
        .context("No rule source configured (task.rules_page_id or task.rules_path)")?;
    let snapshot = RuleSnapshot::new(source, banners, evaluation);

    let mut submitter_options = SubmitterOptions::from_settings(&config.task);
    if options.test_page.is_some() {
        submitter_options = submitter_options.in_test_mode();
    }
    let driver = BatchDriver::new(
        service.clone(),
        EditSubmitter::new(service.clone(), submitter_options),
        config.task.batch_size,
    );

    if let Some(title) = &options.test_page {
        let evaluator = snapshot.refresh(service.as_ref()).await?;
        info!(title = %title, "running test page");
        let stats = driver.run_test_page(&evaluator, title).await?;
        display::print_run_summary(&stats);
        return Ok(());
    }

    let mut total = RunStats::default();
    let mut pass: u64 = 0;
    loop {
        pass += 1;
        info!(pass, "starting pass");
        let stats = driver.run_pass(&snapshot, &config.task.corpus_path).await?;
        total.merge(&stats);

        if !options.continuous {
            break;
        }
        let rules = snapshot.current().map(|evaluator| evaluator.rules().len());
        display::print_pass_summary(pass, rules, &stats);
    }

    display::print_run_summary(&total);
    Ok(())
}

async fn run_sandbox(
    config: &ScantagConfig,
    service: Arc<dyn DocumentService>,
    banners: BannerRecognizer,
    evaluation: EvaluationOptions,
) -> Result<()> {
    let Some(settings) = config.sandbox.clone() else {
        bail!("No [sandbox] section in the config");
    };

    let submitter = EditSubmitter::new(
        service.clone(),
        SubmitterOptions::from_settings(&config.task).in_test_mode(),
    );
    let driver = BatchDriver::new(service.clone(), submitter, config.task.batch_size);
    let report = SandboxReport::new(service, settings, banners, evaluation, driver);

    let outcome = report.regenerate().await?;
    display::print_sandbox_summary(&outcome);
    Ok(())
}

/// Create the API client and log in.
async fn connect(config: &ScantagConfig) -> Result<Arc<dyn DocumentService>> {
    let wiki = &config.wiki;
    let options = ClientOptions {
        user_agent: wiki.user_agent.clone(),
        timeout: Duration::from_secs(wiki.timeout_secs),
        requests_per_second: Some(wiki.requests_per_second),
        maxlag: Some(wiki.maxlag),
        maxlag_retries: wiki.maxlag_retries,
    };
    let client = WikiClient::new(&wiki.api_url, &options)
        .with_context(|| format!("Failed to create API client for {}", wiki.api_url))?;

    let Some(password) = wiki.password() else {
        bail!("No bot password; set wiki.password or {}", PASSWORD_ENV);
    };
    client
        .login(&wiki.username, &password)
        .await
        .with_context(|| format!("Failed to log in as {}", wiki.username))?;
    info!(user = %wiki.username, "logged in");

    Ok(Arc::new(client))
}
