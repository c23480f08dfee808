//! Default user-field sanitation
//!
//! Mirrors the host's filters for the global fields: markup is stripped to
//! its text (script and style bodies dropped), the display name is folded
//! onto a single line and the biography keeps its line breaks. The text stays
//! HTML-escaped, so a cleaned value cleans to itself and never carries markup.

use scraper::Html;

use crate::types::OverrideField;

use super::traits::Sanitizer;

/// Elements whose text content never survives sanitation
const DROPPED_ELEMENTS: &[&str] = &["script", "style", "template", "noscript"];

/// The default profile-field sanitation ruleset
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileSanitizer;

impl ProfileSanitizer {
    pub fn new() -> Self {
        Self
    }
}

impl Sanitizer for ProfileSanitizer {
    fn sanitize(&self, field: OverrideField, raw: &str) -> String {
        let text = strip_markup(raw);
        match field {
            OverrideField::DisplayName => text.split_whitespace().collect::<Vec<_>>().join(" "),
            OverrideField::Description => text
                .replace("\r\n", "\n")
                .replace('\r', "\n")
                .trim()
                .to_string(),
        }
    }
}

/// Reduce an HTML fragment to its visible text, re-escaped
fn strip_markup(raw: &str) -> String {
    if !raw.contains(['<', '>', '&']) {
        return raw.to_string();
    }

    let fragment = Html::parse_fragment(raw);
    let mut text = String::with_capacity(raw.len());
    for node in fragment.root_element().descendants() {
        let Some(chunk) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| DROPPED_ELEMENTS.iter().any(|name| *name == el.name()))
        });
        if !hidden {
            escape_text(chunk, &mut text);
        }
    }
    text
}

fn escape_text(chunk: &str, out: &mut String) {
    for c in chunk.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}
