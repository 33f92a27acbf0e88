//! Scantag Rules - pattern rules and the per-document tagging decision
//!
//! This crate turns a rule source (a JSON object keyed by pattern text) into
//! validated [`Rule`] values and runs them against document bodies.
//!
//! # Architecture
//!
//! - **Definitions**: raw rule objects as they appear in the rule source
//! - **Rules**: compiled, immutable patterns with their tagging templates
//! - **Placement**: inserts rendered prefixes after any leading banner block
//! - **Evaluation**: runs every rule against the original body and stages
//!   the combined insertions
//!
//! # Example
//!
//! ```json
//! {
//!     "\\bstub\\b": {
//!         "task": "Tag stubs",
//!         "noTagIf": "\\{\\{stub-notice",
//!         "prefix": "{{stub-notice}}\n",
//!         "detected": "a stub"
//!     }
//! }
//! ```

pub mod constants;
pub mod definition;
pub mod rule;
pub mod loader;
pub mod template;
pub mod placement;
pub mod exclusion;
pub mod evaluator;

// Re-export core types
pub use constants::*;
pub use definition::{NoTagIf, RuleDefinition, RuleDefinitions};
pub use rule::{Exclusion, Rule, RuleSet};
pub use loader::{LoadReport, RuleLoader};
pub use placement::{BannerRecognizer, DEFAULT_BANNER_TEMPLATES};
pub use exclusion::bot_allowed;
pub use evaluator::{DocumentEvaluator, Evaluation, EvaluationOptions};

/// Result type for rule operations
pub type Result<T> = std::result::Result<T, RuleError>;

/// Error types for rule loading and evaluation
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("Regex `{pattern}` is invalid: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("noTagIf regex for `{pattern}` is invalid: {reason}")]
    InvalidExclusionPattern { pattern: String, reason: String },

    #[error("noTagIf for `{pattern}` is neither a regex nor false")]
    InvalidExclusion { pattern: String },

    #[error("No detected string for `{pattern}`")]
    MissingDetection { pattern: String },

    #[error("Rule `{pattern}` is defined more than once")]
    DuplicatePattern { pattern: String },

    #[error("Rule `{pattern}` is invalid: {reason}")]
    InvalidDefinition { pattern: String, reason: String },

    #[error("Rule source is too large: {size} bytes (max {max})")]
    SourceTooLarge { size: u64, max: u64 },

    #[error("Failed to load rules from {path}: {source}")]
    LoadError {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid rule source JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl RuleError {
    /// The pattern source text this error refers to, if any
    pub fn pattern(&self) -> Option<&str> {
        match self {
            RuleError::InvalidPattern { pattern, .. }
            | RuleError::InvalidExclusionPattern { pattern, .. }
            | RuleError::InvalidExclusion { pattern }
            | RuleError::MissingDetection { pattern }
            | RuleError::DuplicatePattern { pattern }
            | RuleError::InvalidDefinition { pattern, .. } => Some(pattern),
            _ => None,
        }
    }
}
