//! Primary article pass backed by `dom_smoothie`.
//!
//! A cheap gate runs first: the sanitized document must hold at least one
//! paragraph-like block with text outside links. Only then is the full
//! readability algorithm run. The result is rejected when it has no title
//! or no text, so the caller can fall back.
use super::block_text;
use dom_smoothie::{Config, Readability};
use scraper::{ElementRef, Html, Node, Selector};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::LazyLock;
use tracing::debug;

static FIRST_PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());

/// Blocks that may carry article text, besides the preserved tags.
const READERABLE_TAGS: &[&str] = &["p", "article", "div", "td", "section", "main"];

#[derive(Debug, Clone, PartialEq)]
pub struct ReadabilityOptions {
    /// Minimum text length of an accepted article, in characters.
    pub char_threshold: usize,
    pub nb_top_candidates: usize,
    /// Tags kept verbatim in the article and counted as readable blocks.
    pub preserve: Vec<String>,
}

impl Default for ReadabilityOptions {
    fn default() -> Self {
        Self {
            char_threshold: 0,
            nb_top_candidates: 5,
            preserve: vec!["pre".into(), "code".into()],
        }
    }
}

impl ReadabilityOptions {
    fn to_config(&self) -> Config {
        Config {
            char_threshold: self.char_threshold,
            n_top_candidates: self.nb_top_candidates,
            // Scripts are gone after sanitizing, JSON-LD included.
            disable_json_ld: true,
            ..Default::default()
        }
    }
}

/// Raw output of a successful primary pass, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub content: String,
    pub text_content: String,
    pub excerpt: String,
    pub byline: Option<String>,
    pub site_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ReadabilityExtractor {
    options: ReadabilityOptions,
}

impl ReadabilityExtractor {
    pub fn new(options: ReadabilityOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReadabilityOptions {
        &self.options
    }

    /// Whether some paragraph-like block carries text outside links.
    pub fn is_readerable(&self, doc: &Html) -> bool {
        doc.root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| {
                let name = el.value().name();
                READERABLE_TAGS.contains(&name) || self.options.preserve.iter().any(|t| t == name)
            })
            .any(|el| has_non_link_text(&el))
    }

    /// Run the primary pass over sanitized `html`. `None` means the page has
    /// no article with both a title and text.
    pub fn parse(&self, html: &str, doc: &Html) -> Option<Article> {
        if !self.is_readerable(doc) {
            return None;
        }

        let config = self.options.to_config();
        let parsed = catch_unwind(AssertUnwindSafe(|| {
            let mut readability = Readability::new(html, None, Some(config)).ok()?;
            readability.parse().ok()
        }));
        let article = match parsed {
            Ok(Some(article)) => article,
            Ok(None) => return None,
            Err(_) => {
                debug!(target: "extract", "extract.readability_panicked");
                return None;
            }
        };

        let title = article.title.trim().to_string();
        if title.is_empty() {
            debug!(target: "extract", "extract.untitled");
            return None;
        }

        let content = article.content.to_string();
        let fragment = Html::parse_fragment(&content);
        let text_content = block_text(&fragment.root_element());
        let text_chars = text_content.chars().filter(|c| !c.is_whitespace()).count();
        if text_chars == 0 || text_chars < self.options.char_threshold {
            return None;
        }

        let excerpt = article
            .excerpt
            .filter(|e| !e.trim().is_empty())
            .or_else(|| {
                fragment
                    .select(&FIRST_PARAGRAPH)
                    .map(|p| p.text().collect::<String>())
                    .find(|t| !t.trim().is_empty())
            })
            .unwrap_or_else(|| text_content.trim_start().to_string());

        Some(Article {
            title,
            content,
            text_content,
            excerpt,
            byline: article.byline,
            site_name: article.site_name,
        })
    }
}

fn has_non_link_text(el: &ElementRef) -> bool {
    el.descendants().any(|node| match node.value() {
        Node::Text(text) if !text.trim().is_empty() => !node
            .ancestors()
            .take_while(|a| a.id() != el.id())
            .filter_map(ElementRef::wrap)
            .any(|a| a.value().name() == "a"),
        _ => false,
    })
}
