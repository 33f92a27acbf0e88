use crate::types::ScantagConfig;
use std::fs;
use std::path::Path;
use thiserror::Error;
use url::Url;

/// Largest batch a bot account may request in one query
pub const MAX_BATCH_SIZE: usize = 500;

/// Validation errors for a parsed configuration
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid API URL {0}: {1}")]
    InvalidApiUrl(String, url::ParseError),

    #[error("API URL must use http or https: {0}")]
    UnsupportedScheme(String),

    #[error("Batch size {0} is out of range (1-{max})", max = MAX_BATCH_SIZE)]
    BatchSize(usize),

    #[error("Exactly one of task.rules_page_id and task.rules_path must be set")]
    RuleSource,

    #[error("wiki.username must not be empty")]
    EmptyUsername,

    #[error("sandbox.test_page_prefix must not be empty")]
    EmptyTestPagePrefix,

    #[error("sandbox.{0} must be a page id")]
    SandboxPageId(&'static str),

    #[error("wiki.requests_per_second must be at least 1")]
    RequestRate,
}

/// Validate an API endpoint URL
pub fn validate_api_url(api_url: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(api_url)
        .map_err(|e| ValidationError::InvalidApiUrl(api_url.to_string(), e))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::UnsupportedScheme(api_url.to_string()));
    }

    Ok(url)
}

/// Validate a batch size
pub fn validate_batch_size(batch_size: usize) -> Result<(), ValidationError> {
    if batch_size == 0 || batch_size > MAX_BATCH_SIZE {
        return Err(ValidationError::BatchSize(batch_size));
    }
    Ok(())
}

/// Validate a whole configuration
pub fn validate_config(config: &ScantagConfig) -> Result<(), ValidationError> {
    validate_api_url(&config.wiki.api_url)?;

    if config.wiki.username.trim().is_empty() {
        return Err(ValidationError::EmptyUsername);
    }

    if config.wiki.requests_per_second == 0 {
        return Err(ValidationError::RequestRate);
    }

    validate_batch_size(config.task.batch_size)?;

    if config.task.rules_page_id.is_some() == config.task.rules_path.is_some() {
        return Err(ValidationError::RuleSource);
    }

    if let Some(sandbox) = &config.sandbox {
        if sandbox.rules_page_id == 0 {
            return Err(ValidationError::SandboxPageId("rules_page_id"));
        }
        if sandbox.page_id == 0 {
            return Err(ValidationError::SandboxPageId("page_id"));
        }
        if sandbox.test_page_prefix.trim().is_empty() {
            return Err(ValidationError::EmptyTestPagePrefix);
        }
    }

    Ok(())
}

/// Set restrictive permissions on config file (Unix only)
///
/// The file may hold a bot password.
#[cfg(unix)]
pub fn set_config_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o600); // rw------- (user read/write only)
    fs::set_permissions(path, perms)?;
    Ok(())
}

/// Set config permissions (no-op on Windows for now)
#[cfg(not(unix))]
pub fn set_config_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
