//! Error types for Scantag core.
//!
//! Everything here ends the run. Per-document conditions that the run
//! recovers from are reported as [`crate::DocumentOutcome`] values instead.

use scantag_wiki::RejectionCode;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for Scantag core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors of a tagging or sandbox run.
#[derive(Debug, Error)]
pub enum Error {
    /// The bot account can no longer write.
    #[error("Lost write access while editing {title} ({code}); the bot may have been blocked")]
    PermissionLost {
        /// Page whose edit was refused.
        title: String,
        /// Rejection that signalled the loss.
        code: RejectionCode,
    },

    /// The document service failed outside its rejection vocabulary.
    #[error("Document service failure while {context}: {source}")]
    Service {
        /// What the run was doing.
        context: String,
        /// The underlying service error.
        #[source]
        source: scantag_wiki::Error,
    },

    /// The rule source could not be loaded.
    #[error(transparent)]
    Rules(#[from] scantag_rules::RuleError),

    /// A page the run depends on does not exist.
    #[error("Page not found: {page}")]
    PageNotFound {
        /// Title or page id of the missing page.
        page: String,
    },

    /// The sandbox page could not be saved.
    #[error("Failed to save the sandbox: {code}")]
    SandboxRejected {
        /// Rejection returned for the save.
        code: RejectionCode,
    },

    /// The corpus file could not be read.
    #[error("Failed to read corpus {path}: {source}")]
    Corpus {
        /// Path to the corpus file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn service(context: impl Into<String>, source: scantag_wiki::Error) -> Self {
        Error::Service {
            context: context.into(),
            source,
        }
    }
}
