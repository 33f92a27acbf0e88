//! Prefix and suffix templates
//!
//! Templates reference capture groups of the rule's primary match:
//! `$1`..`$n` (or `${n}`) for numbered groups, `$name` for named groups and
//! `$$` for a literal dollar sign. As with any `$name` reference, the longest
//! run of name characters is taken, so `$1a` names a group called `1a`;
//! write `${1}a` to follow a group with letters.

use regex::Captures;

/// Render a template against the captures of a match
pub fn render(template: &str, captures: &Captures<'_>) -> String {
    let mut rendered = String::with_capacity(template.len());
    captures.expand(template, &mut rendered);
    rendered
}

/// Escape text so a regex replacement inserts it literally
pub fn escape_replacement(text: &str) -> String {
    text.replace('$', "$$")
}
