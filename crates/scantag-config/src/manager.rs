use crate::types::ScantagConfig;
use crate::validation::{set_config_permissions, validate_config, ValidationError};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during config management
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config file not found at {0}")]
    ConfigNotFound(PathBuf),

    #[error("Config file already exists at {0}")]
    ConfigExists(PathBuf),

    #[error("Config directory not found")]
    ConfigDirNotFound,
}

/// Manager for the Scantag configuration file
///
/// The default location is `<config dir>/scantag/config.toml`
/// (`~/.config/scantag/config.toml` on Linux).
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
    config: ScantagConfig,
}

impl ConfigManager {
    /// Get the default config path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::ConfigDirNotFound)?;
        Ok(config_dir.join("scantag").join("config.toml"))
    }

    /// Load config from default location
    pub async fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path).await
    }

    /// Load and validate config from a specific path
    pub async fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !tokio::fs::try_exists(path).await? {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let contents = tokio::fs::read_to_string(path).await?;
        let config: ScantagConfig = toml::from_str(&contents)?;
        validate_config(&config)?;
        debug!(path = %path.display(), "loaded config");

        Ok(Self {
            config_path: path.to_path_buf(),
            config,
        })
    }

    /// Initialize a new config file at the default location
    pub async fn init() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;
        Self::init_at(&config_path).await
    }

    /// Initialize config at specific path
    ///
    /// Refuses to overwrite an existing file.
    pub async fn init_at(path: &Path) -> Result<Self, ConfigError> {
        if tokio::fs::try_exists(path).await? {
            return Err(ConfigError::ConfigExists(path.to_path_buf()));
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let config = ScantagConfig::default();
        let toml_str = toml::to_string_pretty(&config)?;
        tokio::fs::write(path, toml_str).await?;

        // Set restrictive permissions (sync operation, uses std::fs)
        set_config_permissions(path)?;

        Ok(Self {
            config_path: path.to_path_buf(),
            config,
        })
    }

    /// Get reference to config
    pub fn config(&self) -> &ScantagConfig {
        &self.config
    }

    /// Consume the manager, keeping the config
    pub fn into_config(self) -> ScantagConfig {
        self.config
    }

    /// Path the config was loaded from
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let manager = ConfigManager::init_at(&config_path).await.unwrap();
        assert_eq!(manager.config().version, "1.0");
        assert_eq!(manager.path(), config_path.as_path());

        let loaded = ConfigManager::load_from(&config_path).await.unwrap();
        assert_eq!(loaded.config(), manager.config());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        ConfigManager::init_at(&config_path).await.unwrap();
        let result = ConfigManager::init_at(&config_path).await;
        assert!(matches!(result, Err(ConfigError::ConfigExists(_))));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = ConfigManager::load_from(&temp_dir.path().join("missing.toml")).await;
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[wiki]
username = "Yapperbot"

[task]
rules_page_id = 1
rules_path = "rules.json"
corpus_path = "articles.txt"
"#,
        )
        .unwrap();

        let result = ConfigManager::load_from(&config_path).await;
        assert!(matches!(
            result,
            Err(ConfigError::Validation(ValidationError::RuleSource))
        ));
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[wiki\nusername = ").unwrap();

        let result = ConfigManager::load_from(&config_path).await;
        assert!(matches!(result, Err(ConfigError::TomlDe(_))));
    }
}
