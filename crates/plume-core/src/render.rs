//! Content rendering pipeline
//!
//! Two stages, both pure functions of the input:
//!
//! 1. Structural parse: markdown -> HTML (`pulldown-cmark`), with literal
//!    newlines inside a paragraph rendered as line breaks.
//! 2. Sanitization: the parsed HTML passes through a fixed allow-list of
//!    tags and attributes (`ammonia`). Anything outside the lists is
//!    dropped, and `data:` URLs are rejected by scheme. This stage is the
//!    security boundary and runs on every rendering - there is no way to
//!    skip it.
//!
//! Rendering is best-effort display logic: a parser failure degrades to
//! [`RENDER_FALLBACK`] instead of propagating an error.

use std::collections::{HashMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};

use ammonia::Builder;
use pulldown_cmark::{html, Event, Options, Parser};

/// Placeholder emitted when the structural parse fails.
///
/// Part of the contract: callers and tests may assert on it.
pub const RENDER_FALLBACK: &str = "<p>(failed to render content)</p>";

/// Title used when a document yields no usable heading or text line
pub const UNTITLED: &str = "Untitled";

/// Maximum length of an extracted title, in characters
const TITLE_MAX_CHARS: usize = 100;

/// Maximum length of a slug, in characters
const SLUG_MAX_CHARS: usize = 50;

/// Render raw markup to sanitized HTML
pub fn render(raw: &str) -> String {
    // The markdown parser does not fail on any input in practice; the
    // placeholder covers a parser panic so display code never sees one.
    let parsed = catch_unwind(AssertUnwindSafe(|| markdown_to_html(raw)))
        .unwrap_or_else(|_| RENDER_FALLBACK.to_string());

    sanitizer().clean(&parsed).to_string()
}

/// Stage 1: structural markdown parse
fn markdown_to_html(raw: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    // A literal newline inside a paragraph becomes a line break.
    let events = Parser::new_ext(raw, options).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });

    let mut out = String::new();
    html::push_html(&mut out, events);
    out
}

/// Stage 2 sanitizer with the fixed allow-lists
fn sanitizer() -> Builder<'static> {
    let tags: HashSet<&str> = [
        "h1", "h2", "h3", "h4", "h5", "h6", "p", "br", "strong", "em", "b", "i", "del", "s",
        "ul", "ol", "li", "table", "thead", "tbody", "tr", "th", "td", "blockquote", "pre",
        "code", "a", "img", "div", "span", "hr",
    ]
    .into_iter()
    .collect();

    let generic_attributes: HashSet<&str> =
        ["title", "class", "id"].into_iter().collect();

    let mut tag_attributes: HashMap<&str, HashSet<&str>> = HashMap::new();
    tag_attributes.insert("a", ["href", "target", "rel"].into_iter().collect());
    tag_attributes.insert("img", ["src", "alt"].into_iter().collect());

    let mut builder = Builder::default();
    builder
        .tags(tags)
        .generic_attributes(generic_attributes)
        .tag_attributes(tag_attributes)
        // rel is caller-controlled (allow-listed above), not auto-injected
        .link_rel(None)
        // No data: URIs; they are rejected by scheme, not merely filtered
        // per tag.
        .url_schemes(["http", "https", "mailto"].into_iter().collect());
    builder
}

/// Extract a display title from raw markup.
///
/// The first top-level heading wins; otherwise the first non-separator
/// non-empty line, truncated to 100 characters; otherwise a fixed fallback.
pub fn extract_title(raw: &str) -> String {
    for line in raw.lines() {
        if let Some(heading) = line.trim().strip_prefix("# ") {
            let heading = heading.trim();
            if !heading.is_empty() {
                return truncate_chars(heading, TITLE_MAX_CHARS);
            }
        }
    }

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_separator_line(trimmed) {
            continue;
        }
        return truncate_chars(trimmed, TITLE_MAX_CHARS);
    }

    UNTITLED.to_string()
}

/// Turn a title into a URL-safe slug: lowercase, non-alphanumeric runs
/// collapsed to a single hyphen, trimmed, at most 50 characters.
pub fn slugify(title: &str) -> String {
    let mut slug = String::new();
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let mut slug = truncate_chars(slug.trim_end_matches('-'), SLUG_MAX_CHARS);
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Horizontal rules and front-matter fences: lines made only of
/// `-`, `=`, `*`, `_` and whitespace
fn is_separator_line(line: &str) -> bool {
    line.chars()
        .all(|c| matches!(c, '-' | '=' | '*' | '_') || c.is_whitespace())
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let html = render("# Hello\n\nSome *emphasis* and **bold**.");
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<em>emphasis</em>"));
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn test_render_newline_becomes_line_break() {
        let html = render("line one\nline two");
        assert!(html.contains("<br"));
    }

    #[test]
    fn test_render_strips_script() {
        let html = render("<script>alert(1)</script>**bold**");
        assert!(!html.contains("script"));
        assert!(!html.contains("alert"));
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn test_render_strips_event_handler_attributes() {
        let html = render("<p onclick=\"evil()\" id=\"ok\">hi</p>");
        assert!(!html.contains("onclick"));
        assert!(!html.contains("evil"));
        assert!(html.contains("id=\"ok\""));
    }

    #[test]
    fn test_render_rejects_data_uris() {
        let html = render("![x](data:image/svg+xml;base64,PHN2Zz4=)");
        assert!(!html.contains("data:"));
    }

    #[test]
    fn test_render_rejects_javascript_urls() {
        let html = render("[click](javascript:alert(1))");
        assert!(!html.contains("javascript:"));
    }

    #[test]
    fn test_render_keeps_allowed_link_attributes() {
        let html = render("<a href=\"https://example.com\" target=\"_blank\" rel=\"noopener\">x</a>");
        assert!(html.contains("href=\"https://example.com\""));
        assert!(html.contains("target=\"_blank\""));
        assert!(html.contains("rel=\"noopener\""));
    }

    #[test]
    fn test_render_table() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn test_extract_title_prefers_heading() {
        assert_eq!(extract_title("# T\n\nbody"), "T");
        // Heading wins even when text precedes it
        assert_eq!(extract_title("intro line\n\n# Real Title\n"), "Real Title");
    }

    #[test]
    fn test_extract_title_falls_back_to_first_text_line() {
        assert_eq!(extract_title("---\n\nJust some text\nmore"), "Just some text");
    }

    #[test]
    fn test_extract_title_truncates_long_lines() {
        let long = "x".repeat(150);
        assert_eq!(extract_title(&long).chars().count(), 100);
    }

    #[test]
    fn test_extract_title_fallback_literal() {
        assert_eq!(extract_title(""), UNTITLED);
        assert_eq!(extract_title("---\n===\n   \n"), UNTITLED);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World! 2024"), "hello-world-2024");
        assert_eq!(slugify("  --weird--  title--  "), "weird-title");
        assert_eq!(slugify("CamelCase AND spaces"), "camelcase-and-spaces");
    }

    #[test]
    fn test_slugify_truncates_to_fifty_chars() {
        let long = "word ".repeat(30);
        let slug = slugify(&long);
        assert!(slug.chars().count() <= 50);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_slugify_all_punctuation_is_empty() {
        assert_eq!(slugify("!!! ???"), "");
    }
}
