//! Fallback preview synthesis when the primary adapter errors or is
//! unavailable (spec §4.5).

use crate::adapter::{Preview, PreviewMetadata};
use crate::change_tracker::ChangeDecision;

/// Build a fallback preview: the last known-good preview augmented with a
/// diagnostic if one exists, else an HTML-escaped `<pre>` of the body.
pub fn synthesize_fallback(last_good_preview: Option<&str>, body: &str) -> Preview {
    let html = match last_good_preview {
        Some(last_good) => format!(
            "{last_good}\n<!-- fallback: showing last known-good preview; renderer unavailable -->"
        ),
        None => format!("<pre>{}</pre>", html_escape(body)),
    };
    let total_lines = body.lines().count().max(1);
    Preview {
        html,
        metadata: PreviewMetadata {
            adapter: "fallback".to_string(),
            fallback: true,
            decision: ChangeDecision::Full,
            changed_lines: total_lines,
            total_lines,
        },
    }
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
#[path = "fallback_tests.rs"]
mod tests;
