//! Rule definitions as they appear in the rule source
//!
//! The rule source is a single JSON object. Each key is the source text of a
//! pattern and each value describes what to do when that pattern matches:
//!
//! ```json
//! {
//!     "pattern source": {
//!         "task": "Brief description of task",
//!         "example": "Something that would be tagged",
//!         "noTagIf": "pattern that suppresses the rule, or false",
//!         "prefix": "text to insert at the top, $1..$n for capture groups",
//!         "suffix": "text to append at the end",
//!         "detected": "what was detected, used in the edit summary",
//!         "testpage": "page the sandbox runs this rule against"
//!     }
//! }
//! ```

use crate::{Result, RuleError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// All entries of a rule source, in source order
///
/// Unlike a plain JSON map this keeps repeated keys, so that a pattern
/// defined twice can be reported instead of silently overwritten.
#[derive(Debug, Clone, Default)]
pub struct RuleDefinitions {
    entries: Vec<(String, Value)>,
}

impl RuleDefinitions {
    /// Parse a rule source document
    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Raw entries in source order
    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fail on the first pattern source text that appears more than once
    pub fn check_unique(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (pattern, _) in &self.entries {
            if !seen.insert(pattern.as_str()) {
                return Err(RuleError::DuplicatePattern {
                    pattern: pattern.clone(),
                });
            }
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for RuleDefinitions {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{MapAccess, Visitor};
        use std::fmt;

        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RuleDefinitions;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an object mapping pattern text to rule definitions")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    entries.push((key, value));
                }
                Ok(RuleDefinitions { entries })
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// The `noTagIf` field: a suppressing pattern, or a boolean marker
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum NoTagIf {
    Pattern(String),
    Flag(bool),
}

/// A single rule definition
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDefinition {
    /// What was detected; follows the word "detected" in the edit summary
    #[serde(default)]
    pub detected: Option<String>,

    /// Template inserted at the top of the document
    #[serde(default)]
    pub prefix: Option<String>,

    /// Template appended to the end of the document
    #[serde(default)]
    pub suffix: Option<String>,

    /// Suppressing pattern, or `false` to always tag
    #[serde(default)]
    pub no_tag_if: Option<NoTagIf>,

    /// Brief description of the task
    #[serde(default)]
    pub task: Option<String>,

    /// Example of something the rule tags
    #[serde(default)]
    pub example: Option<String>,

    /// Page the sandbox runs this rule against
    #[serde(default)]
    pub testpage: Option<String>,
}

impl RuleDefinition {
    /// Interpret one raw entry of the rule source
    pub fn from_value(pattern: &str, value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(RuleError::InvalidDefinition {
                pattern: pattern.to_string(),
                reason: "definition is not an object".to_string(),
            });
        }

        RuleDefinition::deserialize(value).map_err(|e| RuleError::InvalidDefinition {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
    }
}
