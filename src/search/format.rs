//! Rendering of normalized search results into tool-response text.

use std::fmt::Write;

use super::{SearchProvider, MAX_FORMATTED_RESULTS};

/// One result after provider-specific field mapping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Provider response reduced to what the formatter needs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchResults {
    /// Instant answer / summary, when the provider offers one.
    pub answer: Option<String>,
    pub hits: Vec<SearchHit>,
}

const SNIPPET_MAX_CHARS: usize = 400;

/// Format results as markdown for the model.
///
/// Layout is stable: a level-2 heading naming the query, an optional answer
/// paragraph, at most [`MAX_FORMATTED_RESULTS`] numbered entries, and a footer
/// naming the provider.
pub fn format_results(query: &str, provider: SearchProvider, results: &SearchResults) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## Search results for \"{}\"", query);
    out.push('\n');

    if let Some(answer) = results.answer.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        let _ = writeln!(out, "**Summary:** {}", collapse_whitespace(answer));
        out.push('\n');
    }

    if results.hits.is_empty() {
        out.push_str("No results found.\n\n");
    }

    for (i, hit) in results.hits.iter().take(MAX_FORMATTED_RESULTS).enumerate() {
        let title = if hit.title.trim().is_empty() {
            "Untitled"
        } else {
            hit.title.trim()
        };
        let _ = writeln!(out, "{}. **{}**", i + 1, title);
        let _ = writeln!(out, "   {}", truncate_chars(&collapse_whitespace(&hit.snippet), SNIPPET_MAX_CHARS));
        let _ = writeln!(out, "   Source: {}", hit.url.trim());
        out.push('\n');
    }

    let _ = write!(out, "---\n_Results provided by {}_", provider.display_name());
    out
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
