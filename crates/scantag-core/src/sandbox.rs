//! Sandbox report
//!
//! Renders the sandbox rule source as a wikitable on the sandbox page, one
//! section per rule, and runs each rule against its declared test page.
//! The table starts with a stamp naming the rule source revision it was
//! built from; if the stamp is current, nothing is regenerated.
//!
//! Unlike a tagging run, invalid rules do not abort the report. Each one
//! renders as an error row.

use crate::driver::{BatchDriver, RunStats};
use crate::error::{Error, Result};
use scantag_config::SandboxSettings;
use scantag_rules::{
    BannerRecognizer, DocumentEvaluator, EvaluationOptions, Rule, RuleLoader, RuleSet,
};
use scantag_wiki::{DocumentService, EditOutcome, EditRequest, PageRef, RevisionMeta};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, info, warn};

const SUMMARY: &str = "Updating sandbox from JSON";

const HEADER: &str = r#"<!-- Remove the ts template to force the sandbox to be regenerated -->
{|class="wikitable"
|-
! Task !! Example !! Don't tag if matches !! Use noTagIf? !! Prefix the article with !! Suffix the article with !! Detected... !! Test page
"#;

const FOOTER: &str = "\n|}";

const CELL_SEPARATOR: &str = " || ";

/// Stamp naming the rule source revision a table was built from
pub fn stamp(meta: &RevisionMeta) -> String {
    format!("{{{{/ts|{}|{}|{}}}}}", meta.revid, meta.timestamp, meta.user)
}

fn code_cell(out: &mut String, value: &str) {
    let _ = write!(out, "<code><nowiki>{}</nowiki></code>{}", value, CELL_SEPARATOR);
}

fn text_cell(out: &mut String, value: &str) {
    let _ = write!(out, "<nowiki>{}</nowiki>{}", value, CELL_SEPARATOR);
}

fn section_heading(out: &mut String, pattern: &str) {
    let _ = write!(
        out,
        "|-\n! colspan=\"8\" | <code><nowiki>{}</nowiki></code>\n|-\n| ",
        pattern
    );
}

fn rule_cells(out: &mut String, rule: &Rule) {
    let exclusion = rule.exclusion();
    text_cell(out, rule.task());
    code_cell(out, rule.example());
    code_cell(out, exclusion.pattern_source().unwrap_or(""));
    code_cell(out, if exclusion.is_enabled() { "true" } else { "false" });
    code_cell(out, rule.prefix());
    code_cell(out, rule.suffix());
    text_cell(out, rule.detected());
}

fn error_cell(out: &mut String, error: &scantag_rules::RuleError) {
    let _ = write!(
        out,
        "colspan=\"8\" {{{{no O|<code><nowiki>{}</nowiki></code>}}}}",
        error
    );
}

/// Result of a sandbox regeneration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxOutcome {
    /// The stamp matched the rule source; nothing was done
    UpToDate,
    /// The table was rebuilt and saved
    Saved(SandboxSummary),
    /// The table was rebuilt but matched the saved page
    NoChange(SandboxSummary),
}

/// What went into a regenerated table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SandboxSummary {
    /// Rules rendered
    pub rules: usize,
    /// Entries rendered as error rows
    pub invalid: usize,
    /// Test pages run and marked up to date
    pub tests_run: usize,
    /// Counters of the test page runs
    pub test_stats: RunStats,
}

/// Regenerates the sandbox page
pub struct SandboxReport {
    service: Arc<dyn DocumentService>,
    settings: SandboxSettings,
    banners: BannerRecognizer,
    options: EvaluationOptions,
    driver: BatchDriver,
}

impl SandboxReport {
    /// `driver` runs the test pages; give it a test-mode submitter
    pub fn new(
        service: Arc<dyn DocumentService>,
        settings: SandboxSettings,
        banners: BannerRecognizer,
        options: EvaluationOptions,
        driver: BatchDriver,
    ) -> Self {
        Self {
            service,
            settings,
            banners,
            options,
            driver,
        }
    }

    /// Rebuild the sandbox table if the rule source changed
    pub async fn regenerate(&self) -> Result<SandboxOutcome> {
        let rules_page = PageRef::Id(self.settings.rules_page_id);
        let meta = self
            .service
            .revision_meta(&rules_page)
            .await
            .map_err(|e| Error::service("fetching sandbox rule metadata", e))?;
        let stamp = stamp(&meta);

        let sandbox_page = PageRef::Id(self.settings.page_id);
        let sandbox = self
            .service
            .fetch(&sandbox_page)
            .await
            .map_err(|e| Error::service("fetching the sandbox page", e))?
            .ok_or_else(|| Error::PageNotFound {
                page: sandbox_page.to_string(),
            })?;

        if sandbox.text.starts_with(&stamp) {
            info!("no sandbox changes to update");
            return Ok(SandboxOutcome::UpToDate);
        }

        let source = self
            .service
            .fetch(&rules_page)
            .await
            .map_err(|e| Error::service("fetching the sandbox rule source", e))?
            .ok_or_else(|| Error::PageNotFound {
                page: rules_page.to_string(),
            })?;

        let (table, summary) = self.render(&stamp, &source.text).await?;

        let request = EditRequest {
            page: sandbox_page,
            text: table,
            summary: SUMMARY.to_string(),
            bot: true,
            base_timestamp: Some(sandbox.base_timestamp),
            start_timestamp: Some(sandbox.start_timestamp),
        };

        match self.service.edit(&request).await {
            Ok(EditOutcome::Saved { .. }) => {
                info!(rules = summary.rules, invalid = summary.invalid, "sandbox updated");
                Ok(SandboxOutcome::Saved(summary))
            }
            Ok(EditOutcome::NoChange) => {
                info!("sandbox changes detected, but the rebuilt table is unchanged");
                Ok(SandboxOutcome::NoChange(summary))
            }
            Err(err) => match err.rejection() {
                Some(code) if code.is_fatal() => Err(Error::PermissionLost {
                    title: sandbox.title,
                    code,
                }),
                Some(code) => Err(Error::SandboxRejected { code }),
                None => Err(Error::service("saving the sandbox", err)),
            },
        }
    }

    /// Render the table for a rule source, running test pages on the way
    async fn render(&self, stamp: &str, source: &str) -> Result<(String, SandboxSummary)> {
        let report = RuleLoader::new().inspect_str(source)?;
        let mut summary = SandboxSummary::default();
        let mut table = String::with_capacity(source.len() * 2);

        table.push_str(stamp);
        table.push_str(HEADER);

        for (pattern, result) in report.into_entries() {
            section_heading(&mut table, &pattern);

            let rule = match result {
                Ok(rule) => rule,
                Err(e) => {
                    debug!(pattern = %pattern, error = %e, "invalid sandbox rule");
                    error_cell(&mut table, &e);
                    summary.invalid += 1;
                    continue;
                }
            };

            rule_cells(&mut table, &rule);
            summary.rules += 1;

            let Some(testpage) = rule.testpage().map(str::to_string) else {
                continue;
            };
            if !testpage.starts_with(&self.settings.test_page_prefix) {
                warn!(testpage = %testpage, "invalid test page");
                continue;
            }

            info!(testpage = %testpage, "processing test page");
            let evaluator = DocumentEvaluator::new(
                Arc::new(RuleSet::from_iter([rule])),
                self.banners.clone(),
                self.options.clone(),
            );
            match self.driver.run_test_page(&evaluator, &testpage).await {
                Ok(stats) => {
                    summary.test_stats.merge(&stats);
                    summary.tests_run += 1;
                    let _ = write!(table, "{{{{ph|{}|Up-to-date}}}}", testpage);
                }
                Err(Error::PageNotFound { page }) => {
                    warn!(testpage = %page, "test page does not exist");
                }
                Err(e) => return Err(e),
            }
        }

        table.push_str(FOOTER);
        Ok((table, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_format() {
        let meta = RevisionMeta {
            revid: 1234,
            timestamp: "2024-04-01T00:00:00Z".to_string(),
            user: "Editor".to_string(),
        };
        assert_eq!(stamp(&meta), "{{/ts|1234|2024-04-01T00:00:00Z|Editor}}");
    }

    #[test]
    fn test_rule_row() {
        let rules = RuleLoader::new()
            .load_str(
                r#"{"stub": {"task": "Tag stubs", "example": "a stub", "detected": "a stub",
                    "prefix": "{{Stub}}\n", "noTagIf": "\\{\\{stub"}}"#,
            )
            .unwrap();
        let mut row = String::new();
        rule_cells(&mut row, rules.get("stub").unwrap());

        assert_eq!(
            row,
            "<nowiki>Tag stubs</nowiki> || \
             <code><nowiki>a stub</nowiki></code> || \
             <code><nowiki>\\{\\{stub</nowiki></code> || \
             <code><nowiki>true</nowiki></code> || \
             <code><nowiki>{{Stub}}\n</nowiki></code> || \
             <code><nowiki></nowiki></code> || \
             <nowiki>a stub</nowiki> || "
        );
    }

    #[test]
    fn test_disabled_exclusion_leaves_pattern_cell_empty() {
        let rules = RuleLoader::new()
            .load_str(r#"{"orphan": {"detected": "an orphan", "suffix": "\n{{Orphan}}", "noTagIf": false}}"#)
            .unwrap();
        let mut row = String::new();
        rule_cells(&mut row, rules.get("orphan").unwrap());

        let cells: Vec<&str> = row.split(CELL_SEPARATOR).collect();
        assert_eq!(cells[2], "<code><nowiki></nowiki></code>");
        assert_eq!(cells[3], "<code><nowiki>false</nowiki></code>");
    }
}
