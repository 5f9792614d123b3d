//! crates/mooproof_core/src/ui/render.rs
//!
//! Renders model feedback as lightly formatted HTML.
//!
//! Only a small Markdown subset is recognised: bold, italic, paragraphs, line
//! breaks, leading list numbers and leading `-`/`*` bullets. Everything else
//! is shown as escaped text.

use std::sync::LazyLock;

use regex::Regex;

static BOLD_STARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static BOLD_UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"__([^_]+)__").unwrap());
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*\n]+)\*").unwrap());
static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\n+").unwrap());

// List markers only count at the start of a rendered line.
static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(<p>|<br>)(\d+)\.\s").unwrap());
static BULLET_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(<p>|<br>)[-*]\s+").unwrap());

/// Escapes the characters that would otherwise be read as markup.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Formats feedback or a chat reply for display.
pub fn render_feedback(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    let escaped = escape_html(&normalized);

    let html = BOLD_STARS.replace_all(&escaped, "<strong>${1}</strong>");
    let html = BOLD_UNDERSCORES.replace_all(&html, "<strong>${1}</strong>");
    let html = ITALIC.replace_all(&html, "<em>${1}</em>");
    let html = PARAGRAPH_BREAK.replace_all(&html, "</p><p>");
    let html = format!("<p>{}</p>", html.replace('\n', "<br>"));

    let html = NUMBERED_ITEM.replace_all(&html, "${1}<strong>${2}.</strong> ");
    BULLET_ITEM.replace_all(&html, "${1}• ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_the_supported_markdown_subset() {
        let html = render_feedback("**bold** and *italic*\n\nNew para\n1. first\n- bullet");
        assert_eq!(
            html,
            "<p><strong>bold</strong> and <em>italic</em></p>\
             <p>New para<br><strong>1.</strong> first<br>• bullet</p>"
        );
    }

    #[test]
    fn markup_in_the_input_is_escaped_first() {
        let html = render_feedback("Use <b>tags</b> & **care**");
        assert_eq!(
            html,
            "<p>Use &lt;b&gt;tags&lt;/b&gt; &amp; <strong>care</strong></p>"
        );
    }

    #[test]
    fn numbers_inside_a_sentence_are_left_alone() {
        let html = render_feedback("Version 2. is fine\n3. Fix commas");
        assert_eq!(
            html,
            "<p>Version 2. is fine<br><strong>3.</strong> Fix commas</p>"
        );
    }

    #[test]
    fn underscore_bold_and_star_bullets() {
        let html = render_feedback("__Note__\n* first\n* second");
        assert_eq!(
            html,
            "<p><strong>Note</strong><br>• first<br>• second</p>"
        );
    }

    #[test]
    fn several_blank_lines_make_one_paragraph_break() {
        assert_eq!(render_feedback("a\r\n\r\n\r\nb"), "<p>a</p><p>b</p>");
    }
}
