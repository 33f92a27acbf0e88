//! Edit submission for a single document
//!
//! A document is evaluated, submitted, and classified by the service's
//! answer. Conflicts re-fetch the document and start over from evaluation,
//! in a loop bounded by [`SubmitterOptions::max_conflict_retries`].

use crate::error::{Error, Result};
use scantag_config::TaskSettings;
use scantag_rules::DocumentEvaluator;
use scantag_wiki::{Document, DocumentService, EditOutcome, EditRequest, PageRef, RejectionCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How edits are submitted and summarised
#[derive(Debug, Clone)]
pub struct SubmitterOptions {
    /// Text before the joined detection labels
    pub summary_prefix: String,
    /// Text after the joined detection labels
    pub summary_suffix: String,
    /// Prepended to the summary in test mode
    pub test_marker: String,
    /// Mark summaries as test edits
    pub test_mode: bool,
    /// Pause after every saved edit
    pub cooldown: Duration,
    /// Re-fetches allowed after edit conflicts
    pub max_conflict_retries: u32,
}

impl SubmitterOptions {
    pub fn from_settings(task: &TaskSettings) -> Self {
        Self {
            summary_prefix: task.summary_prefix.clone(),
            summary_suffix: task.summary_suffix.clone(),
            test_marker: task.sandbox_marker.clone(),
            test_mode: false,
            cooldown: Duration::from_secs(task.edit_cooldown_secs),
            max_conflict_retries: task.max_conflict_retries,
        }
    }

    /// Same options with test-mode summaries
    pub fn in_test_mode(mut self) -> Self {
        self.test_mode = true;
        self
    }
}

impl Default for SubmitterOptions {
    fn default() -> Self {
        Self::from_settings(&TaskSettings::default())
    }
}

/// What happened to one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// No rule fired, or the document opted out
    Untouched,
    /// A new revision was saved
    Edited {
        /// Detection labels of the rules that fired
        detected: Vec<String>,
    },
    /// The service found the new body identical to the current one
    NoChange,
    /// The page was deleted or protected; not retried
    Ignored(RejectionCode),
    /// Every attempt ran into an edit conflict
    ConflictAbandoned {
        /// Submissions made
        attempts: u32,
    },
    /// The page disappeared while re-fetching after a conflict
    Vanished,
    /// Any other rejection; logged and skipped
    Rejected(RejectionCode),
}

/// Submits tagging edits through a [`DocumentService`]
pub struct EditSubmitter {
    service: Arc<dyn DocumentService>,
    options: SubmitterOptions,
}

impl EditSubmitter {
    pub fn new(service: Arc<dyn DocumentService>, options: SubmitterOptions) -> Self {
        Self { service, options }
    }

    /// Build the edit summary for a set of detection labels
    pub fn summary(&self, detected: &[String]) -> String {
        let marker = if self.options.test_mode {
            self.options.test_marker.as_str()
        } else {
            ""
        };
        format!(
            "{}{}{}{}",
            marker,
            self.options.summary_prefix,
            detected.join("; "),
            self.options.summary_suffix
        )
    }

    /// Evaluate a document and submit the edit it needs
    ///
    /// Returns `Err` only for conditions that must end the run: lost write
    /// access, or a service failure that is not a structured rejection.
    pub async fn process(
        &self,
        evaluator: &DocumentEvaluator,
        document: Document,
    ) -> Result<DocumentOutcome> {
        let mut document = document;
        let mut attempts: u32 = 0;

        loop {
            let evaluation = evaluator.evaluate(&document.text);
            if !evaluation.needs_edit() {
                return Ok(DocumentOutcome::Untouched);
            }

            let detected = evaluation.detected().to_vec();
            let text = evaluator.apply(&document.text, &evaluation);
            let request = EditRequest::for_document(&document, text, self.summary(&detected));
            attempts += 1;

            let rejection = match self.service.edit(&request).await {
                Ok(EditOutcome::Saved { new_revid }) => {
                    info!(
                        title = %document.title,
                        revid = ?new_revid,
                        detected = %detected.join("; "),
                        "tagged document"
                    );
                    if !self.options.cooldown.is_zero() {
                        tokio::time::sleep(self.options.cooldown).await;
                    }
                    return Ok(DocumentOutcome::Edited { detected });
                }
                Ok(EditOutcome::NoChange) => {
                    info!(title = %document.title, "edit made no change");
                    return Ok(DocumentOutcome::NoChange);
                }
                Err(err) => match err.rejection() {
                    Some(code) => code,
                    None => {
                        return Err(Error::service(
                            format!("editing {}", document.title),
                            err,
                        ))
                    }
                },
            };

            match rejection {
                code if code.is_fatal() => {
                    return Err(Error::PermissionLost {
                        title: document.title,
                        code,
                    });
                }
                RejectionCode::Conflict => {
                    if attempts > self.options.max_conflict_retries {
                        warn!(
                            title = %document.title,
                            attempts,
                            "edit conflicted on every attempt; skipping"
                        );
                        return Ok(DocumentOutcome::ConflictAbandoned { attempts });
                    }
                    debug!(title = %document.title, attempts, "edit conflict, re-fetching");
                    let page = PageRef::Title(document.title.clone());
                    match self.service.fetch(&page).await {
                        Ok(Some(fresh)) => document = fresh,
                        Ok(None) => {
                            info!(title = %document.title, "document vanished after a conflict");
                            return Ok(DocumentOutcome::Vanished);
                        }
                        Err(err) => {
                            return Err(Error::service(
                                format!("re-fetching {}", document.title),
                                err,
                            ))
                        }
                    }
                }
                code @ (RejectionCode::Deleted | RejectionCode::Protected) => {
                    info!(
                        title = %document.title,
                        detected = %detected.join("; "),
                        reason = %code,
                        "document cannot be edited; ignoring"
                    );
                    return Ok(DocumentOutcome::Ignored(code));
                }
                code => {
                    warn!(title = %document.title, code = %code, "edit rejected; skipping");
                    return Ok(DocumentOutcome::Rejected(code));
                }
            }
        }
    }
}
