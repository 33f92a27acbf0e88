//! In-memory document service
//!
//! Pages live in a map behind a shared lock. Revision timestamps come from
//! a logical clock that ticks once per saved revision, so stale base
//! timestamps are detected exactly as the live service detects them.
//!
//! # Thread Safety
//!
//! Uses `Arc<RwLock<..>>`; clones share the same pages.

use crate::error::{Error, Result};
use crate::service::DocumentService;
use crate::types::{Document, EditOutcome, EditRequest, PageRef, RevisionMeta};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Logical clock start (2024-01-01T00:00:00Z)
const CLOCK_EPOCH: i64 = 1_704_067_200;

#[derive(Debug, Clone)]
struct StoredPage {
    page_id: u64,
    text: String,
    revid: u64,
    timestamp: String,
    user: String,
}

#[derive(Debug, Default)]
struct State {
    pages: HashMap<String, StoredPage>,
    next_page_id: u64,
    next_revid: u64,
    tick: i64,
    rejections: HashMap<String, VecDeque<String>>,
    fetches: HashMap<String, usize>,
    submissions: usize,
    saved: Vec<EditRequest>,
}

impl State {
    fn now(&self) -> String {
        let at = DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(CLOCK_EPOCH + self.tick);
        at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    fn advance(&mut self) -> String {
        self.tick += 1;
        self.now()
    }

    fn save(&mut self, title: &str, text: String, user: &str) -> u64 {
        self.next_revid += 1;
        let revid = self.next_revid;
        let timestamp = self.advance();

        match self.pages.get_mut(title) {
            Some(page) => {
                page.text = text;
                page.revid = revid;
                page.timestamp = timestamp;
                page.user = user.to_string();
            }
            None => {
                self.next_page_id += 1;
                self.pages.insert(
                    title.to_string(),
                    StoredPage {
                        page_id: self.next_page_id,
                        text,
                        revid,
                        timestamp,
                        user: user.to_string(),
                    },
                );
            }
        }
        revid
    }

    fn resolve(&self, page: &PageRef) -> Option<(String, StoredPage)> {
        match page {
            PageRef::Title(title) => self
                .pages
                .get(title)
                .map(|p| (title.clone(), p.clone())),
            PageRef::Id(id) => self
                .pages
                .iter()
                .find(|(_, p)| p.page_id == *id)
                .map(|(t, p)| (t.clone(), p.clone())),
        }
    }

    fn document(&mut self, page: &PageRef) -> Option<Document> {
        let (title, stored) = self.resolve(page)?;
        *self.fetches.entry(title.clone()).or_default() += 1;
        Some(Document {
            title,
            page_id: stored.page_id,
            text: stored.text,
            base_timestamp: stored.timestamp,
            start_timestamp: self.now(),
        })
    }
}

/// In-memory [`DocumentService`]
#[derive(Debug, Clone, Default)]
pub struct MemoryWiki {
    state: Arc<RwLock<State>>,
}

impl MemoryWiki {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a wiki holding the given pages
    pub fn with_pages<I, T, B>(pages: I) -> Self
    where
        I: IntoIterator<Item = (T, B)>,
        T: Into<String>,
        B: Into<String>,
    {
        let wiki = Self::new();
        for (title, text) in pages {
            wiki.insert_page(title, text);
        }
        wiki
    }

    /// Create or overwrite a page, returning its page id
    pub fn insert_page(&self, title: impl Into<String>, text: impl Into<String>) -> u64 {
        let title = title.into();
        let mut state = self.state.write();
        state.save(&title, text.into(), "Setup");
        state.pages[&title].page_id
    }

    /// Save a revision as another user, making earlier fetches stale
    pub fn concurrent_edit(&self, title: &str, text: impl Into<String>) {
        self.state.write().save(title, text.into(), "OtherUser");
    }

    pub fn delete_page(&self, title: &str) {
        self.state.write().pages.remove(title);
    }

    /// Current body of a page
    pub fn text(&self, title: &str) -> Option<String> {
        self.state.read().pages.get(title).map(|p| p.text.clone())
    }

    pub fn page_id(&self, title: &str) -> Option<u64> {
        self.state.read().pages.get(title).map(|p| p.page_id)
    }

    /// Reject the next `times` edits to `title` with API error `code`
    pub fn reject_next_edits(&self, title: &str, code: &str, times: usize) {
        let mut state = self.state.write();
        let queue = state.rejections.entry(title.to_string()).or_default();
        queue.extend(std::iter::repeat(code.to_string()).take(times));
    }

    /// How many times a page has been fetched
    pub fn fetch_count(&self, title: &str) -> usize {
        self.state.read().fetches.get(title).copied().unwrap_or(0)
    }

    /// Edit submissions received, accepted or not
    pub fn submission_count(&self) -> usize {
        self.state.read().submissions
    }

    /// Edits that saved a new revision, in order
    pub fn saved_edits(&self) -> Vec<EditRequest> {
        self.state.read().saved.clone()
    }
}

#[async_trait]
impl DocumentService for MemoryWiki {
    async fn fetch_batch(&self, titles: &[String]) -> Result<Vec<Document>> {
        let mut state = self.state.write();
        Ok(titles
            .iter()
            .filter_map(|title| state.document(&PageRef::Title(title.clone())))
            .collect())
    }

    async fn fetch(&self, page: &PageRef) -> Result<Option<Document>> {
        Ok(self.state.write().document(page))
    }

    async fn revision_meta(&self, page: &PageRef) -> Result<RevisionMeta> {
        let state = self.state.read();
        let (_, stored) = state
            .resolve(page)
            .ok_or_else(|| Error::MissingPage(page.to_string()))?;
        Ok(RevisionMeta {
            revid: stored.revid,
            timestamp: stored.timestamp,
            user: stored.user,
        })
    }

    async fn edit(&self, request: &EditRequest) -> Result<EditOutcome> {
        let mut state = self.state.write();
        state.submissions += 1;

        let Some((title, stored)) = state.resolve(&request.page) else {
            return Err(Error::api("missingtitle", "The page you specified doesn't exist."));
        };

        if let Some(code) = state.rejections.get_mut(&title).and_then(VecDeque::pop_front) {
            return Err(Error::api(code, "Rejected by test setup."));
        }

        if let Some(base) = &request.base_timestamp {
            if *base != stored.timestamp {
                return Err(Error::api("editconflict", "Edit conflict."));
            }
        }

        if request.text == stored.text {
            return Ok(EditOutcome::NoChange);
        }

        let revid = state.save(&title, request.text.clone(), "Scantag");
        state.saved.push(request.clone());
        Ok(EditOutcome::Saved {
            new_revid: Some(revid),
        })
    }
}
