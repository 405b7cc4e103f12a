#![allow(dead_code)]

use async_trait::async_trait;
use sift_common::{ClassifiedError, PipelineConfig, SiftError};
use sift_drivers::sift_browser::behavioral::Entropy;
use sift_web::browser::{BrowsingContext, PageSession, SessionManager};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// What the next page opened by the scripted browser does.
#[derive(Debug, Clone)]
pub enum Step {
    /// Navigation commits with `status` and the page serves `html`.
    Serve { status: Option<u16>, html: String },
    /// Navigation fails with this message.
    FailNavigation(String),
    /// Opening the tab itself fails.
    FailOpen(String),
}

impl Step {
    pub fn ok(html: &str) -> Self {
        Step::Serve {
            status: Some(200),
            html: html.to_string(),
        }
    }

    pub fn status(status: u16) -> Self {
        Step::Serve {
            status: Some(status),
            html: String::new(),
        }
    }

    pub fn no_response() -> Self {
        Step::Serve {
            status: None,
            html: String::new(),
        }
    }

    pub fn fail(message: &str) -> Self {
        Step::FailNavigation(message.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    OpenContext,
    OpenPage,
    Headers(usize),
    Navigate(String),
    Scroll,
    Content,
    ClosePage,
    CloseContext,
}

#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, wanted: &Event) -> usize {
        self.events().iter().filter(|e| *e == wanted).count()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Navigate(url) => Some(url),
                _ => None,
            })
            .collect()
    }
}

/// Session manager replaying a fixed script of page behaviours.
pub struct ScriptedSessions {
    steps: Arc<Mutex<VecDeque<Step>>>,
    pub log: EventLog,
    fail_launch: Option<String>,
}

impl ScriptedSessions {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into_iter().collect())),
            log: EventLog::default(),
            fail_launch: None,
        }
    }

    pub fn unreachable_driver(message: &str) -> Self {
        Self {
            fail_launch: Some(message.to_string()),
            ..Self::new([])
        }
    }
}

#[async_trait]
impl SessionManager for ScriptedSessions {
    async fn open_context(
        &self,
        _config: &PipelineConfig,
        _entropy: &mut Entropy,
    ) -> sift_common::Result<Box<dyn BrowsingContext>> {
        if let Some(message) = &self.fail_launch {
            return Err(SiftError::Browser(message.clone()));
        }
        self.log.push(Event::OpenContext);
        Ok(Box::new(ScriptedContext {
            steps: self.steps.clone(),
            log: self.log.clone(),
            closed: false,
        }))
    }
}

struct ScriptedContext {
    steps: Arc<Mutex<VecDeque<Step>>>,
    log: EventLog,
    closed: bool,
}

#[async_trait]
impl BrowsingContext for ScriptedContext {
    async fn open_page(&mut self) -> Result<Box<dyn PageSession>, ClassifiedError> {
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Step::fail("script exhausted"));
        if let Step::FailOpen(message) = step {
            return Err(ClassifiedError::from_message(message));
        }
        self.log.push(Event::OpenPage);
        Ok(Box::new(ScriptedPage {
            step,
            log: self.log.clone(),
        }))
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        if !self.closed {
            self.closed = true;
            self.log.push(Event::CloseContext);
        }
        Ok(())
    }
}

struct ScriptedPage {
    step: Step,
    log: EventLog,
}

#[async_trait]
impl PageSession for ScriptedPage {
    async fn apply_headers(&self, headers: &BTreeMap<String, String>) -> Result<(), ClassifiedError> {
        self.log.push(Event::Headers(headers.len()));
        Ok(())
    }

    async fn navigate(&mut self, url: &Url, _timeout: Duration) -> Result<Option<u16>, ClassifiedError> {
        self.log.push(Event::Navigate(url.to_string()));
        match &self.step {
            Step::Serve { status, .. } => Ok(*status),
            Step::FailNavigation(message) | Step::FailOpen(message) => {
                Err(ClassifiedError::from_message(message.clone()))
            }
        }
    }

    async fn is_dom_ready(&self) -> Result<bool, ClassifiedError> {
        Ok(true)
    }

    async fn scroll_to(&self, fraction: f64) -> Result<(), ClassifiedError> {
        assert!((0.0..=1.0).contains(&fraction));
        self.log.push(Event::Scroll);
        Ok(())
    }

    async fn content(&self) -> Result<String, ClassifiedError> {
        self.log.push(Event::Content);
        match &self.step {
            Step::Serve { html, .. } => Ok(html.clone()),
            _ => Err(ClassifiedError::transient("no document")),
        }
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.log.push(Event::ClosePage);
        Ok(())
    }
}

/// Default settings with a fixed seed so jitter is reproducible.
pub fn seeded_config() -> PipelineConfig {
    PipelineConfig {
        rng_seed: Some(7),
        ..PipelineConfig::default()
    }
}

pub const ARTICLE_PAGE: &str = r#"<!doctype html>
<html>
<head>
  <title>Understanding Ownership</title>
  <meta name="author" content="Ferris Crab">
  <meta property="og:site_name" content="Rust Notes">
  <link rel="stylesheet" href="/site.css">
  <style>body { font-family: serif; }</style>
</head>
<body>
  <nav class="menu"><a href="/">Home</a> <a href="/archive">Archive</a></nav>
  <div class="cookie-consent">We use cookies, accept them please.</div>
  <article>
    <h1>Understanding Ownership</h1>
    <p>Ownership is a set of rules that govern how a Rust program manages memory. Some languages have garbage collection, others require explicit allocation.</p>
    <p>Rust uses a third approach: memory is managed through a system of ownership, with rules the compiler checks. If any rule is violated, the program will not compile.</p>
    <pre><code>let s = String::from("hello");
let t = s;</code></pre>
    <p>None of the features of ownership slow down your program while it is running, and they become natural with practice.</p>
  </article>
  <script>trackPageView();</script>
</body>
</html>"#;

pub const LINKS_PAGE: &str = r#"<html><head><title>Link Directory</title></head>
<body>
<div><a href="/one">First destination with a fairly long link label</a></div>
<div><a href="/two">Second destination with a fairly long link label</a></div>
<div><a href="/three">Third destination with a fairly long link label</a></div>
<div><a href="/four">Fourth destination with a fairly long link label</a></div>
</body></html>"#;
