//! Markdown rendering and priority-keyword highlighting for push payloads.

use std::sync::LazyLock;

use pulldown_cmark::{Options, Parser, html};
use regex::Regex;

// Longest alternative first so "medium" never matches as "med".
static PRIORITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(medium|high|med|low)\b").expect("priority regex is valid")
});

const LOW_COLOR: &str = "#99ce88";
const MED_COLOR: &str = "#49a8fc";
const HIGH_COLOR: &str = "#fc6764";

/// Render markdown (summaries are bullet-point markdown) into HTML.
pub fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(text, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Wrap low/med/medium/high priority qualifiers in colored spans.
///
/// Matches whole words in either case and keeps the matched text verbatim.
pub fn highlight_priority(markup: &str) -> String {
    PRIORITY_RE
        .replace_all(markup, |caps: &regex::Captures| {
            let word = &caps[0];
            let color = match word.to_ascii_lowercase().as_str() {
                "low" => LOW_COLOR,
                "high" => HIGH_COLOR,
                _ => MED_COLOR,
            };
            format!(
                r#"<span style="font-weight: bold; background: black; color: {color};">{word}</span>"#
            )
        })
        .into_owned()
}
