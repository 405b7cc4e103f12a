//! Article extraction over sanitized HTML.
//!
//! [`extract_article`] runs the readability pass and falls back to
//! [`fallback_extract`] when the document has no article shape. Every text
//! field of the returned record is normalized.
use crate::normalize::normalize_text;
use crate::sanitize::{SanitizedDocument, sanitize};
use scraper::{ElementRef, Node};
use sift_common::{EXCERPT_CHARS, ExtractionResult};
use tracing::debug;

pub mod fallback;
pub mod readability;

pub use fallback::fallback_extract;
pub use readability::{Article, ReadabilityExtractor, ReadabilityOptions};

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p",
    "pre", "section", "table", "tr", "ul",
];
const PARAGRAPH_TAGS: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "blockquote"];

/// Sanitize raw page HTML and extract an article record from it.
pub fn extract_from_html(raw_html: &str, extractor: &ReadabilityExtractor) -> ExtractionResult {
    extract_article(&sanitize(raw_html), extractor)
}

/// Primary pass with fallback over an already sanitized document.
pub fn extract_article(doc: &SanitizedDocument, extractor: &ReadabilityExtractor) -> ExtractionResult {
    match extractor.parse(&doc.html, &doc.document) {
        Some(article) => {
            debug!(target: "extract", text_bytes = article.text_content.len(), "extract.readable");
            into_result(article)
        }
        None => {
            debug!(target: "extract", "extract.fallback");
            fallback_extract(doc)
        }
    }
}

fn into_result(article: Article) -> ExtractionResult {
    let text_content = normalize_text(Some(&article.text_content));
    let raw_excerpt: String = article.excerpt.chars().take(EXCERPT_CHARS).collect();
    let clean = |v: Option<String>| {
        v.map(|s| normalize_text(Some(&s)))
            .filter(|s| !s.is_empty())
    };
    ExtractionResult {
        title: normalize_text(Some(&article.title)),
        content: article.content,
        length: text_content.chars().count(),
        text_content,
        excerpt: normalize_text(Some(&raw_excerpt)),
        byline: clean(article.byline),
        site_name: clean(article.site_name),
        is_readable: true,
    }
}

/// Text of `el` with line breaks at block boundaries and `<br>`.
///
/// Source newlines inside inline text become spaces; text under `pre` keeps
/// its layout.
pub fn block_text(el: &ElementRef) -> String {
    let mut out = String::new();
    write_block_text(el, false, &mut out);
    out
}

fn write_block_text(el: &ElementRef, verbatim: bool, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                if verbatim {
                    out.push_str(text);
                } else {
                    out.extend(text.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c }));
                }
            }
            Node::Element(_) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = child_el.value().name();
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                let separator = if PARAGRAPH_TAGS.contains(&name) {
                    "\n\n"
                } else if BLOCK_TAGS.contains(&name) {
                    "\n"
                } else if matches!(name, "td" | "th") {
                    " "
                } else {
                    ""
                };
                out.push_str(separator);
                write_block_text(&child_el, verbatim || name == "pre", out);
                out.push_str(separator);
            }
            _ => {}
        }
    }
}
