//! Error types for scantag-wiki

use crate::types::RejectionCode;
use thiserror::Error;

/// Result type alias for document service operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for document service operations
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON deserialization failed
    #[error("Failed to parse JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Structured rejection from the API
    #[error("API error {code}: {info}")]
    Api { code: String, info: String },

    /// Login was refused
    #[error("Login failed: {0}")]
    Login(String),

    /// The server kept reporting replication lag after every retry
    #[error("Server still lagged after {0} retries")]
    MaxlagExceeded(u32),

    /// HTTP status outside the API's error envelope
    #[error("HTTP request failed with status {status}: {url}")]
    Status { status: u16, url: String },

    /// Response did not have the expected shape
    #[error("Malformed API response: {0}")]
    MalformedResponse(String),

    /// Page looked up by id or title does not exist
    #[error("Page not found: {0}")]
    MissingPage(String),
}

impl Error {
    /// Create an API rejection error
    pub fn api(code: impl Into<String>, info: impl Into<String>) -> Self {
        Self::Api {
            code: code.into(),
            info: info.into(),
        }
    }

    /// Create a malformed-response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// The rejection code, if this is a structured API rejection
    ///
    /// Everything else is a transport or protocol failure.
    pub fn rejection(&self) -> Option<RejectionCode> {
        match self {
            Error::Api { code, .. } => Some(RejectionCode::from_code(code)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_only_for_api_errors() {
        assert_eq!(
            Error::api("editconflict", "Edit conflict").rejection(),
            Some(RejectionCode::Conflict)
        );
        assert_eq!(Error::malformed("no edit key").rejection(), None);
        assert_eq!(Error::Login("WrongPass".into()).rejection(), None);
    }
}
