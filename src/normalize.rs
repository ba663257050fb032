// src/normalize.rs
// Title/body extraction for flash content. Providers embed the headline as a
// leading 【...】 prefix; when it is missing the title falls back to the first
// N characters of the tag-stripped content. N varies per route (50/80/100)
// and the observed values are kept as-is.

use once_cell::sync::OnceCell;
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub title: String,
    /// HTML body with the bracket prefix removed exactly once.
    pub body: String,
}

fn bracket_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?s)^【([^】]+)】(.*)$").unwrap())
}

fn tags_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap())
}

/// Split a leading `【X】rest` into (X, rest), both trimmed.
pub fn split_bracket_title(content: &str) -> Option<(String, String)> {
    bracket_re().captures(content).map(|caps| {
        (
            caps[1].trim().to_string(),
            caps[2].trim().to_string(),
        )
    })
}

/// Strip HTML tags globally and decode entities; the plain-text variant.
pub fn strip_tags(html: &str) -> String {
    let no_tags = tags_re().replace_all(html, "");
    html_escape::decode_html_entities(no_tags.as_ref())
        .trim()
        .to_string()
}

/// First `max_chars` characters of the tag-stripped content, with a `…`
/// marker when something was cut.
pub fn fallback_title(content: &str, max_chars: usize) -> String {
    let plain = strip_tags(content);
    let mut chars = plain.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

/// Normalize raw content into a title and an HTML body.
pub fn normalize(content: &str, fallback_len: usize) -> Normalized {
    match split_bracket_title(content) {
        Some((title, body)) => Normalized { title, body },
        None => Normalized {
            title: fallback_title(content, fallback_len),
            body: content.trim().to_string(),
        },
    }
}

/// Drop a leading bracket prefix from a body when it repeats the title
/// (either string containing the other counts as a repeat).
pub fn strip_repeated_bracket_title(title: &str, body: &str) -> String {
    if title.is_empty() {
        return body.to_string();
    }
    if let Some((bracket, rest)) = split_bracket_title(body) {
        if bracket == title || title.contains(&bracket) || bracket.contains(title) {
            return rest;
        }
    }
    body.to_string()
}
