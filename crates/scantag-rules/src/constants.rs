//! Limits applied while compiling and loading rules
//!
//! Rule patterns come from a page that any sufficiently trusted editor can
//! change, so these limits keep a bad pattern from exhausting memory or
//! stalling a full corpus pass.

/// Maximum size of the rule source document (1MB)
pub const MAX_RULE_SOURCE_SIZE: u64 = 1_048_576; // 1MB

/// Maximum length of a single pattern's source text (4096 characters)
///
/// Real rules routinely carry long alternations of template names, so this
/// is considerably looser than a typical user-input limit.
pub const MAX_PATTERN_LENGTH: usize = 4096;

/// Compiled regex size limit (10MB)
pub const REGEX_SIZE_LIMIT: usize = 10_000_000; // 10MB

/// Regex DFA size limit (2MB)
pub const REGEX_DFA_SIZE_LIMIT: usize = 2_000_000; // 2MB

/// Case-insensitivity flag prepended to every rule pattern
pub const CASE_INSENSITIVE_FLAG: &str = "(?i)";
