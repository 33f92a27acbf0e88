//! Rule snapshots
//!
//! A rule set is built in full from its source and only then published.
//! Readers take an `Arc` to the current evaluator and keep using it for the
//! rest of their pass, whatever is published meanwhile.

use crate::error::{Error, Result};
use parking_lot::RwLock;
use scantag_config::TaskSettings;
use scantag_rules::{BannerRecognizer, DocumentEvaluator, EvaluationOptions, RuleLoader, RuleSet};
use scantag_wiki::{DocumentService, PageRef};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Where a rule source is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    /// Body of a wiki page, by page id
    Page(u64),
    /// Local JSON file
    File(PathBuf),
}

impl RuleSource {
    /// The configured rule source; a page id wins over a file
    pub fn from_settings(task: &TaskSettings) -> Option<Self> {
        task.rules_page_id
            .map(RuleSource::Page)
            .or_else(|| task.rules_path.clone().map(RuleSource::File))
    }

    /// Read and validate the whole rule source
    pub async fn load(&self, service: &dyn DocumentService) -> Result<RuleSet> {
        let loader = RuleLoader::new();
        match self {
            RuleSource::Page(id) => {
                let page = PageRef::Id(*id);
                let document = service
                    .fetch(&page)
                    .await
                    .map_err(|e| Error::service("fetching the rule source", e))?
                    .ok_or_else(|| Error::PageNotFound {
                        page: page.to_string(),
                    })?;
                Ok(loader.load_str(&document.text)?)
            }
            RuleSource::File(path) => Ok(loader.load_file(path).await?),
        }
    }
}

/// The published rule set, wrapped in an evaluator
pub struct RuleSnapshot {
    source: RuleSource,
    banners: BannerRecognizer,
    options: EvaluationOptions,
    current: RwLock<Option<Arc<DocumentEvaluator>>>,
}

impl RuleSnapshot {
    pub fn new(source: RuleSource, banners: BannerRecognizer, options: EvaluationOptions) -> Self {
        Self {
            source,
            banners,
            options,
            current: RwLock::new(None),
        }
    }

    pub fn source(&self) -> &RuleSource {
        &self.source
    }

    /// Load the rule source and publish the result
    ///
    /// On failure the previously published snapshot stays in place.
    pub async fn refresh(&self, service: &dyn DocumentService) -> Result<Arc<DocumentEvaluator>> {
        let rules = self.source.load(service).await?;
        Ok(self.publish(rules))
    }

    /// Publish a rule set, replacing the current snapshot
    pub fn publish(&self, rules: RuleSet) -> Arc<DocumentEvaluator> {
        info!(rules = rules.len(), "publishing rule snapshot");
        let evaluator = Arc::new(DocumentEvaluator::new(
            Arc::new(rules),
            self.banners.clone(),
            self.options.clone(),
        ));
        *self.current.write() = Some(Arc::clone(&evaluator));
        evaluator
    }

    /// The current snapshot, if one was published
    pub fn current(&self) -> Option<Arc<DocumentEvaluator>> {
        self.current.read().clone()
    }
}
