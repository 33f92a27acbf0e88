use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable consulted when the config file holds no password
pub const PASSWORD_ENV: &str = "SCANTAG_BOT_PASSWORD";

/// Main configuration structure for Scantag
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScantagConfig {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: String,

    /// Connection to the wiki
    pub wiki: WikiSettings,

    /// Tagging run settings
    pub task: TaskSettings,

    /// Sandbox regeneration settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<SandboxSettings>,

    /// Banner recognition settings
    #[serde(default)]
    pub banners: BannerSettings,
}

impl Default for ScantagConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            wiki: WikiSettings::default(),
            task: TaskSettings::default(),
            sandbox: None,
            banners: BannerSettings::default(),
        }
    }
}

/// Wiki connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WikiSettings {
    /// Action API endpoint (`api.php`)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Bot account name, also checked against `{{bots}}` templates
    pub username: String,

    /// Bot password; falls back to `SCANTAG_BOT_PASSWORD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Client-side request rate limit
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Replication lag, in seconds, at which the server should refuse requests
    #[serde(default = "default_maxlag")]
    pub maxlag: u32,

    /// How many lag refusals to wait out before failing
    #[serde(default = "default_maxlag_retries")]
    pub maxlag_retries: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl WikiSettings {
    /// Password from the config file, or from the environment
    pub fn password(&self) -> Option<String> {
        self.password
            .clone()
            .or_else(|| std::env::var(PASSWORD_ENV).ok())
            .filter(|p| !p.is_empty())
    }

    /// The part of the username that `{{bots}}` templates name
    ///
    /// Bot-password logins use `Account@AppName`; exclusion lists name
    /// only the account.
    pub fn bot_name(&self) -> &str {
        self.username
            .split_once('@')
            .map_or(self.username.as_str(), |(account, _)| account)
    }
}

impl Default for WikiSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            username: "Yapperbot".to_string(),
            password: None,
            user_agent: default_user_agent(),
            requests_per_second: default_requests_per_second(),
            maxlag: default_maxlag(),
            maxlag_retries: default_maxlag_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Tagging run settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskSettings {
    /// Page id of the rule source page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_page_id: Option<u64>,

    /// Local rule source file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_path: Option<PathBuf>,

    /// Newline-separated list of document titles
    pub corpus_path: PathBuf,

    /// Documents fetched per request (1..=500)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause after every saved edit
    #[serde(default = "default_edit_cooldown_secs")]
    pub edit_cooldown_secs: u64,

    /// Re-fetch and retry this many times after an edit conflict
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,

    /// Skip suffixes that are already present verbatim
    #[serde(default)]
    pub guard_suffix: bool,

    #[serde(default = "default_summary_prefix")]
    pub summary_prefix: String,

    #[serde(default = "default_summary_suffix")]
    pub summary_suffix: String,

    /// Prepended to summaries of test-mode edits
    #[serde(default = "default_sandbox_marker")]
    pub sandbox_marker: String,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            rules_page_id: None,
            rules_path: Some(PathBuf::from("rules.json")),
            corpus_path: PathBuf::from("articles.txt"),
            batch_size: default_batch_size(),
            edit_cooldown_secs: default_edit_cooldown_secs(),
            max_conflict_retries: default_max_conflict_retries(),
            guard_suffix: false,
            summary_prefix: default_summary_prefix(),
            summary_suffix: default_summary_suffix(),
            sandbox_marker: default_sandbox_marker(),
        }
    }
}

/// Sandbox regeneration settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SandboxSettings {
    /// Page id of the sandbox rule source
    pub rules_page_id: u64,

    /// Page id of the page the sandbox table is written to
    pub page_id: u64,

    /// Only test pages under this prefix are run
    #[serde(default = "default_test_page_prefix")]
    pub test_page_prefix: String,
}

/// Banner recognition settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BannerSettings {
    /// Template name patterns added to the built-in banner list
    #[serde(default)]
    pub extra_templates: Vec<String>,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_api_url() -> String {
    "https://en.wikipedia.org/w/api.php".to_string()
}

fn default_user_agent() -> String {
    format!(
        "Scantag/{} (https://github.com/foxworth-uni/scantag)",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_requests_per_second() -> u32 {
    1
}

fn default_maxlag() -> u32 {
    3
}

fn default_maxlag_retries() -> u32 {
    10
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_batch_size() -> usize {
    500
}

fn default_edit_cooldown_secs() -> u64 {
    10
}

fn default_max_conflict_retries() -> u32 {
    3
}

fn default_summary_prefix() -> String {
    "[[User:Yapperbot/Scantag|Scantag]] detected ".to_string()
}

fn default_summary_suffix() -> String {
    ". Tagging article.".to_string()
}

fn default_sandbox_marker() -> String {
    "SANDBOX: ".to_string()
}

fn default_test_page_prefix() -> String {
    "User:Yapperbot/Scantag.sandbox/tests/".to_string()
}
