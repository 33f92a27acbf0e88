//! The document service seam
//!
//! Everything the tagging engine needs from the remote document store goes
//! through [`DocumentService`], so the engine can run against the live API
//! ([`crate::WikiClient`]) or an in-memory store ([`crate::MemoryWiki`]).

use crate::types::{Document, EditOutcome, EditRequest, PageRef, RevisionMeta};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Resolve a batch of titles to documents
    ///
    /// Titles that do not exist are left out of the result; the order of
    /// the returned documents follows `titles`.
    async fn fetch_batch(&self, titles: &[String]) -> Result<Vec<Document>>;

    /// Fetch one document, or `None` if it does not exist
    async fn fetch(&self, page: &PageRef) -> Result<Option<Document>>;

    /// Latest revision metadata of a page
    async fn revision_meta(&self, page: &PageRef) -> Result<RevisionMeta>;

    /// Submit a full-body edit
    ///
    /// Rejections come back as [`crate::Error::Api`]; use
    /// [`crate::Error::rejection`] to classify them.
    async fn edit(&self, request: &EditRequest) -> Result<EditOutcome>;
}
