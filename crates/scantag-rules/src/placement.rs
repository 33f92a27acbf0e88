//! Placement of generated text
//!
//! Suffixes are simply appended. Prefixes go after the block of maintenance
//! banners at the top of a document (deletion notices, hatnotes, short
//! descriptions and the like), so that a new maintenance tag lands alongside
//! any existing ones instead of above a hatnote.
//!
//! The banner block is recognised by a single pattern anchored at the start
//! of the document:
//!
//! - an optional deletion-discussion comment block,
//! - followed by any number of banner templates whose names come from an
//!   allow-list, each with optional `|key=value` parameters (which may
//!   themselves hold `{{...}}` templates),
//! - followed by an optional blank line.

use crate::constants::{REGEX_DFA_SIZE_LIMIT, REGEX_SIZE_LIMIT};
use crate::template::escape_replacement;
use crate::{Result, RuleError};
use regex::{Regex, RegexBuilder};

/// Banner template names recognised at the top of a document
///
/// Each entry is a pattern fragment matched case-insensitively against the
/// template name.
pub const DEFAULT_BANNER_TEMPLATES: &[&str] = &[
    // Speedy deletion
    "db",
    "delete",
    r"db-.*?",
    r"speedy deletion-.*?",
    // Proposed deletion, including its dated parameters
    r"(?:proposed deletion|prod blp)/dated(?:\s*\|(?:concern|user|timestamp|help).*)+",
    // Hatnotes and disambiguation
    "about",
    "about-distinguish",
    "ambiguous link",
    "correct title",
    "dablink",
    "disambig-acronym",
    "distinguish",
    "distinguish-otheruses",
    "for",
    "further",
    "hatnote",
    r"other\s?(?:hurricanes|people|persons|places|ships|uses?(?:\s?of)?)",
    "outline",
    r"redirect(?:-(?:acronym|distinguish|several))?",
    r"see\s?(?:also|wiktionary)",
    "selfref",
    r"short(?:desc| description)",
    "the",
    "this",
    "salt",
    "proposed deletion endorsed",
];

const BANNER_OPEN: &str = r"(?i)^\s*(?:((?:\s*";
const DELETION_DISCUSSION: &str = r"(?:<!--.*AfD.*\n\{\{(?:(?:Article for deletion|Afd)/dated|AfDM).*\}\}\n<!--.*(?:\n<!--.*)?AfD.*(?:\s*\n))|";
const TEMPLATE_OPEN: &str = r"\{\{\s*";
const TEMPLATE_NAME_TAIL: &str = r") ?\d*\s*";
const TEMPLATE_PARAMS: &str = r"(?:\|(?:\{\{[^{}]*\}\}|[^{}])*)?";
const TEMPLATE_CLOSE: &str = r"\}\}\n?)+";
const BANNER_CLOSE: &str = r"(?:\s*\n)?)\s*)?";

/// Recognises the leading banner block and inserts prefixes after it
#[derive(Debug, Clone)]
pub struct BannerRecognizer {
    regex: Regex,
}

impl BannerRecognizer {
    /// Build a recogniser from the default allow-list plus extra names
    pub fn new(extra_templates: &[String]) -> Result<Self> {
        // Each name is its own group so a fragment cannot leak into the alternation
        let names: Vec<String> = DEFAULT_BANNER_TEMPLATES
            .iter()
            .copied()
            .chain(extra_templates.iter().map(String::as_str))
            .map(|name| format!("(?:{})", name))
            .collect();

        let mut pattern = String::new();
        pattern.push_str(BANNER_OPEN);
        pattern.push_str(DELETION_DISCUSSION);
        pattern.push_str(TEMPLATE_OPEN);
        pattern.push_str("(?:");
        pattern.push_str(&names.join("|"));
        pattern.push_str(TEMPLATE_NAME_TAIL);
        pattern.push_str(TEMPLATE_PARAMS);
        pattern.push_str(TEMPLATE_CLOSE);
        pattern.push_str(BANNER_CLOSE);

        let regex = RegexBuilder::new(&pattern)
            .size_limit(REGEX_SIZE_LIMIT)
            .dfa_size_limit(REGEX_DFA_SIZE_LIMIT)
            .build()
            .map_err(|e| RuleError::InvalidPattern {
                pattern: format!("banner templates {:?}", extra_templates),
                reason: e.to_string(),
            })?;

        Ok(Self { regex })
    }

    /// The banner block at the start of `text`, if there is one
    pub fn banner_block<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Insert `prefix` immediately after the leading banner block
    ///
    /// The whole anchored match, including whitespace around the banner
    /// block, is replaced by the banner block followed by the prefix. With no
    /// banner block the prefix goes at the very start of the document.
    pub fn insert_prefix(&self, text: &str, prefix: &str) -> String {
        let replacement = format!("${{1}}{}", escape_replacement(prefix));
        self.regex.replacen(text, 1, replacement.as_str()).into_owned()
    }
}

impl Default for BannerRecognizer {
    fn default() -> Self {
        Self::new(&[]).expect("built-in banner pattern compiles")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_banner_inserts_at_start() {
        let banners = BannerRecognizer::default();
        assert_eq!(
            banners.insert_prefix("This is a stub.", "{{stub-notice}}\n"),
            "{{stub-notice}}\nThis is a stub."
        );
        assert_eq!(banners.banner_block("This is a stub."), None);
    }

    #[test]
    fn test_prefix_goes_after_hatnotes() {
        let banners = BannerRecognizer::default();
        let text = "{{Short description|A village}}\n{{About|the village|the river|Foo River}}\nFoo is a village.";
        let tagged = banners.insert_prefix(text, "{{Unreferenced}}\n");
        assert_eq!(
            tagged,
            "{{Short description|A village}}\n{{About|the village|the river|Foo River}}\n{{Unreferenced}}\nFoo is a village."
        );
    }

    #[test]
    fn test_nested_template_parameters() {
        let banners = BannerRecognizer::default();
        let text = "{{For|the band|{{lang|de|Foo}} (band)}}\nBody";
        assert_eq!(
            banners.banner_block(text),
            Some("{{For|the band|{{lang|de|Foo}} (band)}}\n")
        );
    }

    #[test]
    fn test_speedy_deletion_banner() {
        let banners = BannerRecognizer::default();
        let text = "{{db-a7|help=off}}\nA band.";
        assert_eq!(
            banners.insert_prefix(text, "{{Orphan}}\n"),
            "{{db-a7|help=off}}\n{{Orphan}}\nA band."
        );
    }

    #[test]
    fn test_unlisted_template_is_not_a_banner() {
        let banners = BannerRecognizer::default();
        let text = "{{Infobox person|name=X}}\nX is a person.";
        assert_eq!(
            banners.insert_prefix(text, "{{Orphan}}\n"),
            "{{Orphan}}\n{{Infobox person|name=X}}\nX is a person."
        );
    }

    #[test]
    fn test_extra_templates_extend_the_allow_list() {
        let banners = BannerRecognizer::new(&["infobox person".to_string()]).unwrap();
        let text = "{{Infobox person|name=X}}\nX is a person.";
        assert_eq!(
            banners.insert_prefix(text, "{{Orphan}}\n"),
            "{{Infobox person|name=X}}\n{{Orphan}}\nX is a person."
        );
    }

    #[test]
    fn test_extra_template_stays_inside_its_group() {
        let banners = BannerRecognizer::new(&["infobox person)|(?:zzz".to_string()]).unwrap();
        let text = "{{Infobox person|name=X}}\nX is a person.";
        assert_eq!(
            banners.banner_block(text),
            Some("{{Infobox person|name=X}}\n")
        );
        assert_eq!(
            banners.insert_prefix(text, "{{Orphan}}\n"),
            "{{Infobox person|name=X}}\n{{Orphan}}\nX is a person."
        );
    }

    #[test]
    fn test_stray_parenthesis_is_rejected() {
        assert!(BannerRecognizer::new(&["orphan)".to_string()]).is_err());
    }

    #[test]
    fn test_invalid_extra_template_is_rejected() {
        assert!(BannerRecognizer::new(&["(unclosed".to_string()]).is_err());
    }

    #[test]
    fn test_dollar_signs_are_literal() {
        let banners = BannerRecognizer::default();
        assert_eq!(
            banners.insert_prefix("Body", "{{Price|$1}}\n"),
            "{{Price|$1}}\nBody"
        );
    }

    #[test]
    fn test_trailing_blank_line_after_banners_is_kept_in_block() {
        let banners = BannerRecognizer::default();
        let text = "{{Hatnote|Text}}\n\nBody";
        assert_eq!(
            banners.insert_prefix(text, "{{Orphan}}\n"),
            "{{Hatnote|Text}}\n\n{{Orphan}}\nBody"
        );
    }
}
