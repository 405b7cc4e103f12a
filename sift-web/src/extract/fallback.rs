use crate::normalize::normalize_text;
use crate::sanitize::SanitizedDocument;
use scraper::Selector;
use sift_common::{EXCERPT_CHARS, ExtractionResult};
use std::sync::LazyLock;

static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

/// Deterministic extraction used when the primary pass finds no article.
///
/// Takes the `<title>` text, the whole sanitized body as content and the body
/// text; the excerpt is the first [`EXCERPT_CHARS`] characters of the raw
/// body text. Never fails.
pub fn fallback_extract(doc: &SanitizedDocument) -> ExtractionResult {
    let html = &doc.document;
    let title: String = html
        .select(&TITLE)
        .next()
        .map(|t| t.text().collect())
        .unwrap_or_default();

    let (content, raw_text) = match html.select(&BODY).next() {
        Some(body) => (body.inner_html(), body.text().collect::<String>()),
        None => (String::new(), String::new()),
    };

    let raw_excerpt: String = raw_text.chars().take(EXCERPT_CHARS).collect();
    let text_content = normalize_text(Some(&raw_text));

    ExtractionResult {
        title: normalize_text(Some(&title)),
        content,
        length: text_content.chars().count(),
        text_content,
        excerpt: normalize_text(Some(&raw_excerpt)),
        byline: None,
        site_name: None,
        is_readable: false,
    }
}
