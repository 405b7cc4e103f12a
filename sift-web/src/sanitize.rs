//! Noise removal ahead of extraction.
//!
//! Sanitizing runs in two passes. The first strips stylesheet links and
//! `<style>` blocks from the raw string so the parser never sees them. The
//! second walks the parsed tree and writes a fresh serialization that leaves
//! out denylisted elements; the parsed tree itself is never edited.
use regex::Regex;
use scraper::{ElementRef, Html, Node};
use std::borrow::Cow;
use std::sync::LazyLock;

static STYLESHEET_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<link\b[^>]*\brel\s*=\s*["']?stylesheet["']?[^>]*>"#).unwrap()
});
static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap());

const DROPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "svg", "img", "picture", "video", "audio", "iframe",
];

const NOISE_WORDS: &[&str] = &[
    "ad",
    "ads",
    "advert",
    "advertisement",
    "cookie",
    "consent",
    "gdpr",
    "newsletter",
    "subscribe",
    "popup",
    "modal",
    "banner",
    "promo",
];

/// Structural containers never dropped on class/id alone.
const STRUCTURAL_TAGS: &[&str] = &["html", "head", "body", "main", "article"];

/// Text inside these keeps its whitespace verbatim.
const VERBATIM_TAGS: &[&str] = &["pre", "code", "textarea"];

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Cleaned HTML plus its parsed tree.
pub struct SanitizedDocument {
    pub html: String,
    pub document: Html,
}

impl std::fmt::Debug for SanitizedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SanitizedDocument")
            .field("html_len", &self.html.len())
            .finish()
    }
}

/// Run both passes over raw page HTML.
pub fn sanitize(raw: &str) -> SanitizedDocument {
    let stripped = strip_stylesheets(raw);
    let parsed = Html::parse_document(&stripped);
    let html = render_without_noise(&parsed);
    let document = Html::parse_document(&html);
    SanitizedDocument { html, document }
}

/// Remove `<link rel=stylesheet>` tags and `<style>` blocks from the raw string.
pub fn strip_stylesheets(raw: &str) -> Cow<'_, str> {
    match STYLESHEET_LINK.replace_all(raw, "") {
        Cow::Borrowed(s) => STYLE_BLOCK.replace_all(s, ""),
        Cow::Owned(s) => Cow::Owned(STYLE_BLOCK.replace_all(&s, "").into_owned()),
    }
}

/// Serialize `document` without denylisted elements and comments.
pub fn render_without_noise(document: &Html) -> String {
    let mut out = String::with_capacity(1024);
    let root = document.root_element();
    if !is_noise(&root) {
        write_element(&root, false, &mut out);
    }
    out
}

/// Whether `el` is dropped by the tree pass.
pub fn is_noise(el: &ElementRef) -> bool {
    let value = el.value();
    let name = value.name();
    if DROPPED_TAGS.contains(&name) {
        return true;
    }
    if value
        .attr("aria-hidden")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    {
        return true;
    }
    if STRUCTURAL_TAGS.contains(&name) {
        return false;
    }
    let id_matches = value.id().is_some_and(has_noise_token);
    id_matches || value.classes().any(has_noise_token)
}

fn has_noise_token(token: &str) -> bool {
    token
        .split(['-', '_', ' '])
        .filter(|part| !part.is_empty())
        .any(|part| NOISE_WORDS.iter().any(|w| part.eq_ignore_ascii_case(w)))
}

fn write_element(el: &ElementRef, verbatim: bool, out: &mut String) {
    let name = el.value().name();
    out.push('<');
    out.push_str(name);
    for (attr, value) in el.value().attrs() {
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        escape_into(value, true, out);
        out.push('"');
    }
    out.push('>');
    if VOID_TAGS.contains(&name) {
        return;
    }

    let verbatim = verbatim || VERBATIM_TAGS.contains(&name);
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                if verbatim {
                    escape_into(text, false, out);
                } else {
                    escape_into(&collapse_horizontal(text), false, out);
                }
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    if !is_noise(&child_el) {
                        write_element(&child_el, verbatim, out);
                    }
                }
            }
            _ => {}
        }
    }

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn collapse_horizontal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for ch in text.chars() {
        if ch == ' ' || ch == '\t' {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}
