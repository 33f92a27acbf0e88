//! Core domain types for documents and edits

use crate::checksum::md5_hex;
use serde::{Deserialize, Serialize};

/// How a page is identified
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageRef {
    Title(String),
    Id(u64),
}

impl PageRef {
    pub fn title(title: impl Into<String>) -> Self {
        PageRef::Title(title.into())
    }
}

impl std::fmt::Display for PageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageRef::Title(title) => write!(f, "{}", title),
            PageRef::Id(id) => write!(f, "page id {}", id),
        }
    }
}

/// A fetched document with its concurrency tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Page title
    pub title: String,
    /// Numeric page id
    pub page_id: u64,
    /// Body of the latest revision
    pub text: String,
    /// Timestamp of the latest revision (sent back as `basetimestamp`)
    pub base_timestamp: String,
    /// Service time when the document was fetched (sent back as `starttimestamp`)
    pub start_timestamp: String,
}

/// Metadata of a page's latest revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionMeta {
    pub revid: u64,
    pub timestamp: String,
    pub user: String,
}

/// A full-body edit submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    pub page: PageRef,
    pub text: String,
    pub summary: String,
    /// Mark the edit as a bot edit
    pub bot: bool,
    pub base_timestamp: Option<String>,
    pub start_timestamp: Option<String>,
}

impl EditRequest {
    /// Build a request replacing the body of `document`
    ///
    /// Both concurrency tokens of the document are carried, so the service
    /// rejects the edit if the page changed or was deleted after it was
    /// fetched.
    pub fn for_document(
        document: &Document,
        text: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            page: PageRef::Title(document.title.clone()),
            text: text.into(),
            summary: summary.into(),
            bot: true,
            base_timestamp: Some(document.base_timestamp.clone()),
            start_timestamp: Some(document.start_timestamp.clone()),
        }
    }

    /// Hex MD5 of the new body, for the service's integrity check
    pub fn checksum(&self) -> String {
        md5_hex(self.text.as_bytes())
    }
}

/// Result of a submission the service accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// A new revision was saved
    Saved { new_revid: Option<u64> },
    /// The submitted body was identical to the current one
    NoChange,
}

/// Structured rejection codes returned for edit submissions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RejectionCode {
    /// The base revision is stale
    Conflict,
    /// The account lost write access
    PermissionDenied,
    /// The account is blocked
    Blocked,
    /// The page was deleted
    Deleted,
    /// The page is protected against this account
    Protected,
    /// Any other rejection, carrying the raw code
    Other(String),
}

impl RejectionCode {
    /// Map a raw API error code to a rejection code
    pub fn from_code(code: &str) -> Self {
        match code {
            "editconflict" => RejectionCode::Conflict,
            "noedit" | "noedit-anon" | "writeapidenied" | "permissiondenied"
            | "assertuserfailed" | "assertbotfailed" => RejectionCode::PermissionDenied,
            "blocked" | "autoblocked" => RejectionCode::Blocked,
            "pagedeleted" | "missingtitle" | "nosuchpageid" => RejectionCode::Deleted,
            "protectedpage" | "cascadeprotected" | "protectedtitle" => RejectionCode::Protected,
            other => RejectionCode::Other(other.to_string()),
        }
    }

    /// The account can no longer edit at all
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RejectionCode::PermissionDenied | RejectionCode::Blocked
        )
    }
}

impl std::fmt::Display for RejectionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionCode::Conflict => write!(f, "edit conflict"),
            RejectionCode::PermissionDenied => write!(f, "permission denied"),
            RejectionCode::Blocked => write!(f, "blocked"),
            RejectionCode::Deleted => write!(f, "page deleted"),
            RejectionCode::Protected => write!(f, "page protected"),
            RejectionCode::Other(code) => write!(f, "{}", code),
        }
    }
}
