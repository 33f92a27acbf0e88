pub mod manager;
pub mod types;
pub mod validation;

pub use manager::{ConfigError, ConfigManager};
pub use types::{
    BannerSettings, SandboxSettings, ScantagConfig, TaskSettings, WikiSettings, PASSWORD_ENV,
};
pub use validation::{validate_api_url, validate_batch_size, validate_config, ValidationError};
