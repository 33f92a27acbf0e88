//! Document evaluation - runs a rule set against one document
//!
//! Every rule is tested independently against the original body; nothing a
//! rule stages is visible to the next rule. Staged prefixes and suffixes are
//! only combined into a new body by [`DocumentEvaluator::apply`].

use crate::exclusion::bot_allowed;
use crate::placement::BannerRecognizer;
use crate::template::render;
use crate::RuleSet;
use std::sync::Arc;
use tracing::debug;

/// Options that change how rules are applied
#[derive(Debug, Clone, Default)]
pub struct EvaluationOptions {
    /// Username checked against `{{bots}}` allow and deny lists
    pub bot_username: String,

    /// Also skip suffixes whose rendered text is already present
    ///
    /// Prefixes are always guarded; suffixes are not unless this is set.
    pub guard_suffix: bool,
}

/// Result of evaluating one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    prefix: String,
    suffix: String,
    detected: Vec<String>,
    opted_out: bool,
}

impl Evaluation {
    /// Whether anything was staged for insertion
    pub fn needs_edit(&self) -> bool {
        !self.prefix.is_empty() || !self.suffix.is_empty()
    }

    /// Staged prefix text, in rule order
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Staged suffix text, in rule order
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Detection labels of the rules that staged something
    pub fn detected(&self) -> &[String] {
        &self.detected
    }

    /// Whether the document opted out of bot edits
    pub fn opted_out(&self) -> bool {
        self.opted_out
    }
}

/// Runs a rule set against documents
#[derive(Debug, Clone)]
pub struct DocumentEvaluator {
    rules: Arc<RuleSet>,
    banners: BannerRecognizer,
    options: EvaluationOptions,
}

impl DocumentEvaluator {
    pub fn new(rules: Arc<RuleSet>, banners: BannerRecognizer, options: EvaluationOptions) -> Self {
        Self {
            rules,
            banners,
            options,
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Evaluate every rule against `text`
    pub fn evaluate(&self, text: &str) -> Evaluation {
        let mut evaluation = Evaluation::default();

        if !bot_allowed(text, &self.options.bot_username) {
            debug!("document opts out of bot edits");
            evaluation.opted_out = true;
            return evaluation;
        }

        for rule in self.rules.iter() {
            let Some(captures) = rule.pattern().captures(text) else {
                continue;
            };

            if rule.exclusion().excludes(text) {
                debug!(rule = %rule.source(), "rule suppressed by noTagIf");
                continue;
            }

            let mut staged = false;

            if !rule.prefix().is_empty() {
                let rendered = render(rule.prefix(), &captures);
                // An empty rendering is always "contained", so it never stages
                if text.contains(rendered.as_str()) {
                    debug!(rule = %rule.source(), "prefix already present");
                } else {
                    evaluation.prefix.push_str(&rendered);
                    staged = true;
                }
            }

            if !rule.suffix().is_empty() {
                let rendered = render(rule.suffix(), &captures);
                let present = self.options.guard_suffix && text.contains(rendered.as_str());
                if !rendered.is_empty() && !present {
                    evaluation.suffix.push_str(&rendered);
                    staged = true;
                }
            }

            if staged {
                debug!(rule = %rule.source(), detected = %rule.detected(), "rule fired");
                evaluation.detected.push(rule.detected().to_string());
            }
        }

        evaluation
    }

    /// Build the new body from the original and an evaluation of it
    pub fn apply(&self, text: &str, evaluation: &Evaluation) -> String {
        let mut body = if evaluation.prefix.is_empty() {
            text.to_string()
        } else {
            self.banners.insert_prefix(text, &evaluation.prefix)
        };
        body.push_str(&evaluation.suffix);
        body
    }

    /// Evaluate and apply in one step; `None` if no edit is needed
    pub fn tag(&self, text: &str) -> Option<(String, Evaluation)> {
        let evaluation = self.evaluate(text);
        if !evaluation.needs_edit() {
            return None;
        }
        Some((self.apply(text, &evaluation), evaluation))
    }
}
