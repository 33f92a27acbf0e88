//! Compiled rules
//!
//! A [`Rule`] is built once per processing cycle from a [`RuleDefinition`]
//! and is read-only afterwards.

use crate::constants::{
    CASE_INSENSITIVE_FLAG, MAX_PATTERN_LENGTH, REGEX_DFA_SIZE_LIMIT, REGEX_SIZE_LIMIT,
};
use crate::{NoTagIf, Result, RuleDefinition, RuleError};
use regex::{Regex, RegexBuilder};
use std::collections::BTreeMap;

/// Compile a rule pattern case-insensitively with size limits applied
fn compile_pattern(source: &str) -> std::result::Result<Regex, String> {
    if source.len() > MAX_PATTERN_LENGTH {
        return Err(format!(
            "pattern exceeds maximum length of {} characters",
            MAX_PATTERN_LENGTH
        ));
    }

    RegexBuilder::new(&format!("{}{}", CASE_INSENSITIVE_FLAG, source))
        .size_limit(REGEX_SIZE_LIMIT)
        .dfa_size_limit(REGEX_DFA_SIZE_LIMIT)
        .build()
        .map_err(|e| e.to_string())
}

/// What suppresses a rule that would otherwise fire
#[derive(Debug, Clone)]
pub enum Exclusion {
    /// The rule is suppressed whenever this pattern matches the document
    Pattern(Regex),
    /// The rule is never suppressed (`noTagIf: false`)
    Never,
}

impl Exclusion {
    /// Whether the document suppresses the rule
    pub fn excludes(&self, text: &str) -> bool {
        match self {
            Exclusion::Pattern(regex) => regex.is_match(text),
            Exclusion::Never => false,
        }
    }

    /// Whether an exclusion pattern is in use
    pub fn is_enabled(&self) -> bool {
        matches!(self, Exclusion::Pattern(_))
    }

    /// Source text of the exclusion pattern, without the case flag
    pub fn pattern_source(&self) -> Option<&str> {
        match self {
            Exclusion::Pattern(regex) => Some(
                regex
                    .as_str()
                    .strip_prefix(CASE_INSENSITIVE_FLAG)
                    .unwrap_or(regex.as_str()),
            ),
            Exclusion::Never => None,
        }
    }
}

/// A compiled pattern rule and its tagging behaviour
#[derive(Debug, Clone)]
pub struct Rule {
    source: String,
    pattern: Regex,
    exclusion: Exclusion,
    prefix: String,
    suffix: String,
    detected: String,
    task: String,
    example: String,
    testpage: Option<String>,
}

impl Rule {
    /// Validate a definition and compile it into a rule
    ///
    /// Fails if the pattern does not compile, if `noTagIf` is absent or is
    /// anything other than a compilable pattern or `false`, or if the
    /// detection label is missing or empty.
    pub fn new(source: &str, definition: &RuleDefinition) -> Result<Self> {
        let pattern = compile_pattern(source).map_err(|reason| RuleError::InvalidPattern {
            pattern: source.to_string(),
            reason,
        })?;

        let detected = match definition.detected.as_deref() {
            Some(detected) if !detected.trim().is_empty() => detected.to_string(),
            _ => {
                return Err(RuleError::MissingDetection {
                    pattern: source.to_string(),
                })
            }
        };

        let exclusion = match &definition.no_tag_if {
            Some(NoTagIf::Pattern(nti)) => {
                let regex =
                    compile_pattern(nti).map_err(|reason| RuleError::InvalidExclusionPattern {
                        pattern: source.to_string(),
                        reason,
                    })?;
                Exclusion::Pattern(regex)
            }
            Some(NoTagIf::Flag(false)) => Exclusion::Never,
            Some(NoTagIf::Flag(true)) | None => {
                return Err(RuleError::InvalidExclusion {
                    pattern: source.to_string(),
                })
            }
        };

        Ok(Self {
            source: source.to_string(),
            pattern,
            exclusion,
            prefix: definition.prefix.clone().unwrap_or_default(),
            suffix: definition.suffix.clone().unwrap_or_default(),
            detected,
            task: definition.task.clone().unwrap_or_default(),
            example: definition.example.clone().unwrap_or_default(),
            testpage: definition.testpage.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Pattern source text as written in the rule source
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The compiled, case-insensitive primary pattern
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn exclusion(&self) -> &Exclusion {
        &self.exclusion
    }

    /// Prefix template (empty if none)
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Suffix template (empty if none)
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Detection label used in the edit summary
    pub fn detected(&self) -> &str {
        &self.detected
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn example(&self) -> &str {
        &self.example
    }

    pub fn testpage(&self) -> Option<&str> {
        self.testpage.as_deref()
    }

    /// Whether the rule fires on a document
    ///
    /// A rule fires iff its pattern matches and its exclusion does not.
    pub fn fires_on(&self, text: &str) -> bool {
        self.pattern.is_match(text) && !self.exclusion.excludes(text)
    }
}

/// The rules of one processing cycle, keyed by pattern source text
///
/// Iteration is in pattern source order, so rules that insert into the same
/// document always combine in the same order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: BTreeMap<String, Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule, failing if its pattern source text is already present
    pub fn insert(&mut self, rule: Rule) -> Result<()> {
        if self.rules.contains_key(rule.source()) {
            return Err(RuleError::DuplicatePattern {
                pattern: rule.source().to_string(),
            });
        }
        self.rules.insert(rule.source().to_string(), rule);
        Ok(())
    }

    pub fn get(&self, source: &str) -> Option<&Rule> {
        self.rules.get(source)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<Rule> for RuleSet {
    /// Collect rules, keeping the last of any repeated pattern source
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self {
            rules: iter
                .into_iter()
                .map(|rule| (rule.source().to_string(), rule))
                .collect(),
        }
    }
}
