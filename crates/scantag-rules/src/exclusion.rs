//! Bot exclusion
//!
//! Documents can opt out of automated edits with the `{{nobots}}` and
//! `{{bots}}` templates:
//!
//! | Markup | Effect on this bot |
//! |---|---|
//! | `{{nobots}}` | excluded |
//! | `{{bots}}` | allowed |
//! | `{{bots\|allow=all}}` | allowed |
//! | `{{bots\|allow=none}}` | excluded |
//! | `{{bots\|allow=A,B}}` | allowed only if named |
//! | `{{bots\|deny=all}}` | excluded |
//! | `{{bots\|deny=none}}` | allowed |
//! | `{{bots\|deny=A,B}}` | excluded if named |
//! | `{{bots\|optout=...}}` | allowed (message opt-outs only) |

use regex::Regex;
use std::sync::OnceLock;

static BOTS_TEMPLATE: OnceLock<Regex> = OnceLock::new();

fn bots_template() -> &'static Regex {
    BOTS_TEMPLATE.get_or_init(|| {
        Regex::new(r"(?i)\{\{\s*(nobots|bots)\s*((?:\|[^{}]*)?)\}\}")
            .expect("bots template pattern compiles")
    })
}

/// Whether the bot named `bot_username` may edit a document
pub fn bot_allowed(text: &str, bot_username: &str) -> bool {
    let bot = bot_username.trim().to_lowercase();

    for caps in bots_template().captures_iter(text) {
        if caps[1].eq_ignore_ascii_case("nobots") {
            return false;
        }

        for param in caps[2].split('|').filter(|p| !p.trim().is_empty()) {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            let names: Vec<String> = value
                .split(',')
                .map(|name| name.trim().to_lowercase())
                .collect();
            let names_us = names.iter().any(|name| *name == bot || *name == "all");

            match key.trim().to_lowercase().as_str() {
                "allow" => {
                    if !names_us {
                        return false;
                    }
                }
                "deny" => {
                    if names_us {
                        return false;
                    }
                }
                _ => {}
            }
        }
    }

    true
}
