//! Authored HTML to paragraph records and to plain text.
//!
//! This is a line-oriented reduction, not an HTML parser: block ends become
//! line breaks, inline tags are dropped, and bold/italic/underline are
//! detected per resulting line.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::FlowParagraph;

/// Spacing after each generated paragraph, in twips.
pub const PARAGRAPH_SPACE_AFTER: u32 = 200;

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern"))
}

fn block_separator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?i)</?p(?:\s[^>]*)?>|<br\s*/?>|</li\s*>|\n")
}

fn block_end() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?i)</p\s*>|<br\s*/?>|</li\s*>")
}

fn any_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"<[^>]+>")
}

fn blank_lines() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\n\s*\n")
}

fn bold_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?i)<(?:b|strong)(?:\s[^>]*)?>")
}

fn italic_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?i)<(?:i|em)(?:\s[^>]*)?>")
}

fn underline_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?i)<u(?:\s[^>]*)?>")
}

/// Decode the entities rich-text editors emit. `&amp;` goes last so
/// `&amp;lt;` stays `&lt;`.
pub fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn escape_entities(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Split authored HTML into paragraph records, one per non-empty line.
pub fn html_to_paragraphs(html: &str) -> Vec<FlowParagraph> {
    block_separator()
        .split(html)
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let text = decode_entities(&any_tag().replace_all(line, ""));
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            Some(FlowParagraph {
                text: text.to_string(),
                bold: bold_tag().is_match(line),
                italic: italic_tag().is_match(line),
                underline: underline_tag().is_match(line),
                font_size: None,
                space_after: PARAGRAPH_SPACE_AFTER,
            })
        })
        .collect()
}

/// Paragraph records for plain text, e.g. text extracted from an uploaded
/// document. The text is escaped first so stray `<` survive tag stripping.
pub fn text_to_paragraphs(text: &str) -> Vec<FlowParagraph> {
    html_to_paragraphs(&format!("<p>{}</p>", escape_entities(text)))
}

/// Reduce authored HTML to plain text with one line per block.
pub fn html_to_plain_text(html: &str) -> String {
    let text = block_end().replace_all(html, "\n");
    let text = any_tag().replace_all(&text, "");
    normalize_plain_text(&decode_entities(&text))
}

/// Collapse runs of blank lines and trim the ends.
pub fn normalize_plain_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    blank_lines().replace_all(&text, "\n").trim().to_string()
}
