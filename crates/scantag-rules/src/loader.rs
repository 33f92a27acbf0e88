//! Rule loading
//!
//! Two modes are offered over the same rule source:
//!
//! - [`RuleLoader::load_str`] builds a [`RuleSet`] and stops at the first
//!   invalid rule. Processing cycles use this, so a bad edit to the rule
//!   source halts the bot instead of running a partial rule set.
//! - [`RuleLoader::inspect_str`] validates every entry independently and
//!   reports each result, for the sandbox report.

use crate::constants::MAX_RULE_SOURCE_SIZE;
use crate::{Result, Rule, RuleDefinition, RuleDefinitions, RuleError, RuleSet};
use std::path::Path;
use tracing::{debug, info};

/// Per-entry validation results, in source order
#[derive(Debug, Default)]
pub struct LoadReport {
    entries: Vec<(String, Result<Rule>)>,
}

impl LoadReport {
    pub fn entries(&self) -> &[(String, Result<Rule>)] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<(String, Result<Rule>)> {
        self.entries
    }

    pub fn valid_count(&self) -> usize {
        self.entries.iter().filter(|(_, r)| r.is_ok()).count()
    }

    pub fn error_count(&self) -> usize {
        self.entries.len() - self.valid_count()
    }
}

/// Loads rule sources into rule sets
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleLoader;

impl RuleLoader {
    pub fn new() -> Self {
        Self
    }

    /// Parse and validate a rule source, failing on the first invalid rule
    pub fn load_str(&self, source: &str) -> Result<RuleSet> {
        check_size(source.len() as u64)?;

        let definitions = RuleDefinitions::from_json(source)?;
        definitions.check_unique()?;

        let mut rules = RuleSet::new();
        for (pattern, value) in definitions.entries() {
            let definition = RuleDefinition::from_value(pattern, value)?;
            rules.insert(Rule::new(pattern, &definition)?)?;
        }

        info!(rules = rules.len(), "loaded rule set");
        Ok(rules)
    }

    /// Load a rule source from a local file
    pub async fn load_file(&self, path: &Path) -> Result<RuleSet> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| RuleError::LoadError {
                path: path.display().to_string(),
                source: Box::new(e),
            })?;
        check_size(metadata.len())?;

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RuleError::LoadError {
                path: path.display().to_string(),
                source: Box::new(e),
            })?;

        debug!(path = %path.display(), "read rule source");
        self.load_str(&contents)
    }

    /// Validate every entry of a rule source independently
    ///
    /// Only a source that is not a JSON object at all fails as a whole. A
    /// repeated pattern is reported against its second and later entries.
    pub fn inspect_str(&self, source: &str) -> Result<LoadReport> {
        check_size(source.len() as u64)?;

        let definitions = RuleDefinitions::from_json(source)?;
        let mut seen = std::collections::HashSet::new();
        let mut report = LoadReport::default();

        for (pattern, value) in definitions.entries() {
            let result = if !seen.insert(pattern.as_str()) {
                Err(RuleError::DuplicatePattern {
                    pattern: pattern.clone(),
                })
            } else {
                RuleDefinition::from_value(pattern, value)
                    .and_then(|definition| Rule::new(pattern, &definition))
            };
            report.entries.push((pattern.clone(), result));
        }

        Ok(report)
    }
}

fn check_size(size: u64) -> Result<()> {
    if size > MAX_RULE_SOURCE_SIZE {
        return Err(RuleError::SourceTooLarge {
            size,
            max: MAX_RULE_SOURCE_SIZE,
        });
    }
    Ok(())
}
