//! Batch driver
//!
//! Walks the corpus in fixed-size batches, resolves each batch in one
//! request and feeds the documents through the [`EditSubmitter`] one at a
//! time, in corpus order.

use crate::corpus::CorpusReader;
use crate::error::{Error, Result};
use crate::snapshot::RuleSnapshot;
use crate::submitter::{DocumentOutcome, EditSubmitter};
use scantag_rules::DocumentEvaluator;
use scantag_wiki::{DocumentService, PageRef};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncBufRead;
use tracing::{debug, info};

/// Counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Documents evaluated
    pub processed: usize,
    /// Edits saved
    pub edited: usize,
    /// Documents that needed nothing
    pub untouched: usize,
    /// Documents ignored, rejected, vanished, or unchanged by the service
    pub skipped: usize,
    /// Documents abandoned after repeated conflicts
    pub conflicts_abandoned: usize,
    /// Corpus titles with no document behind them
    pub missing: usize,
}

impl RunStats {
    pub fn record(&mut self, outcome: &DocumentOutcome) {
        self.processed += 1;
        match outcome {
            DocumentOutcome::Untouched => self.untouched += 1,
            DocumentOutcome::Edited { .. } => self.edited += 1,
            DocumentOutcome::ConflictAbandoned { .. } => self.conflicts_abandoned += 1,
            DocumentOutcome::NoChange
            | DocumentOutcome::Ignored(_)
            | DocumentOutcome::Rejected(_)
            | DocumentOutcome::Vanished => self.skipped += 1,
        }
    }

    /// Add another run's counters
    pub fn merge(&mut self, other: &RunStats) {
        self.processed += other.processed;
        self.edited += other.edited;
        self.untouched += other.untouched;
        self.skipped += other.skipped;
        self.conflicts_abandoned += other.conflicts_abandoned;
        self.missing += other.missing;
    }
}

/// Drives documents through the submitter
pub struct BatchDriver {
    service: Arc<dyn DocumentService>,
    submitter: EditSubmitter,
    batch_size: usize,
}

impl BatchDriver {
    pub fn new(service: Arc<dyn DocumentService>, submitter: EditSubmitter, batch_size: usize) -> Self {
        Self {
            service,
            submitter,
            batch_size: batch_size.max(1),
        }
    }

    /// One full corpus pass with a freshly published rule snapshot
    pub async fn run_pass(&self, snapshot: &RuleSnapshot, corpus_path: &Path) -> Result<RunStats> {
        let evaluator = snapshot.refresh(self.service.as_ref()).await?;
        let mut corpus = CorpusReader::open(corpus_path).await?;
        info!(corpus = %corpus_path.display(), "starting corpus pass");
        self.run_corpus(&evaluator, &mut corpus).await
    }

    /// Process every title of a corpus
    pub async fn run_corpus<R>(
        &self,
        evaluator: &DocumentEvaluator,
        corpus: &mut CorpusReader<R>,
    ) -> Result<RunStats>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut stats = RunStats::default();

        loop {
            let titles = corpus.next_batch(self.batch_size).await?;
            if titles.is_empty() {
                break;
            }

            let documents = self
                .service
                .fetch_batch(&titles)
                .await
                .map_err(|e| Error::service("fetching a batch", e))?;

            let missing = titles.len().saturating_sub(documents.len());
            if missing > 0 {
                debug!(missing, "batch titles with no document");
            }
            stats.missing += missing;

            for document in documents {
                let outcome = self.submitter.process(evaluator, document).await?;
                stats.record(&outcome);
            }

            info!(
                processed = stats.processed,
                edited = stats.edited,
                "finished batch"
            );
        }

        Ok(stats)
    }

    /// Run the rules against one page, twice
    ///
    /// The second pass sees the first pass's own insertion, so `noTagIf`
    /// patterns that match the inserted text can be checked.
    pub async fn run_test_page(&self, evaluator: &DocumentEvaluator, title: &str) -> Result<RunStats> {
        let mut stats = RunStats::default();
        let page = PageRef::title(title);

        for pass in 1..=2 {
            let document = self
                .service
                .fetch(&page)
                .await
                .map_err(|e| Error::service(format!("fetching test page {}", title), e))?
                .ok_or_else(|| Error::PageNotFound {
                    page: title.to_string(),
                })?;

            let outcome = self.submitter.process(evaluator, document).await?;
            debug!(title, pass, ?outcome, "test pass finished");
            stats.record(&outcome);
        }

        Ok(stats)
    }
}
