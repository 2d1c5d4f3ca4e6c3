//! Page source provider
//!
//! Extraction code never talks to a render engine directly. It sees a page through
//! [`PageHandle`] (element queries, attribute and text reads, clicks, scripts) and
//! obtains handles from a [`PageSource`]. Two sources ship with the crate:
//! - [`HttpPageSource`]: fetches the page over HTTP and queries the static DOM
//! - [`InMemoryPageSource`]: serves fixed documents, for replays and tests
//!
//! Every handle is acquired through [`PageSession`], which closes it on drop so
//! no exit path (success, timeout, failed extraction, panic) leaks a page.

mod fetcher;
mod memory;
mod static_page;

pub use fetcher::{build_http_client, HttpPageSource};
pub use memory::InMemoryPageSource;
pub use static_page::StaticPage;

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Script run on open to hide the usual automation fingerprint
pub const AUTOMATION_MARKER_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined});";

/// Whether the render engine shows a window
///
/// Purely operational; extraction behaves the same in both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Headless,
    Windowed,
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Headless => write!(f, "headless"),
            Self::Windowed => write!(f, "windowed"),
        }
    }
}

/// Errors raised by page interactions
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Element {0:?} is no longer attached to the page")]
    ElementGone(ElementId),

    #[error("Script evaluation failed: {0}")]
    Script(String),
}

/// Opaque reference to an element of one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub usize);

/// Subtree an element query is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The whole document
    Document,
    /// Descendants of one element (a tab panel, for instance)
    Within(ElementId),
}

/// A rendered page, queryable by selector
///
/// Query methods treat invalid selectors and missing elements as "no match"
/// rather than errors, so fallback strategies can fall through cheaply.
pub trait PageHandle: Send + Sync {
    /// URL the page was opened with
    fn url(&self) -> &str;

    /// First element matching `selector` inside `scope`
    fn query_one(&self, scope: Scope, selector: &str) -> Option<ElementId> {
        self.query_all(scope, selector).into_iter().next()
    }

    /// All elements matching `selector` inside `scope`, in document order
    fn query_all(&self, scope: Scope, selector: &str) -> Vec<ElementId>;

    /// Element whose `id` attribute equals `id`
    fn element_by_id(&self, id: &str) -> Option<ElementId>;

    /// Attribute value as currently reported by the page
    fn attribute(&self, element: ElementId, name: &str) -> Option<String>;

    /// The element's `value` property (form controls, editor textareas)
    fn read_value(&self, element: ElementId) -> Option<String>;

    /// The element's text content
    fn read_text(&self, element: ElementId) -> String;

    /// Clicks the element
    fn click(&self, element: ElementId) -> Result<(), PageError>;

    /// Evaluates a script in the page, returning its string result if any
    fn evaluate_script(&self, script: &str) -> Result<Option<String>, PageError>;
}

/// Something that can open pages by URL
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Opens `url`, waiting a bounded time for the page to become ready
    ///
    /// Fails with [`crate::SwatchError::NavigationTimeout`] when the page does not
    /// get ready in time.
    async fn open(&self, url: &str, mode: RenderMode) -> crate::Result<Box<dyn PageHandle>>;

    /// Releases a page obtained from [`PageSource::open`]
    ///
    /// Called exactly once per opened page, right before the handle is dropped.
    fn close(&self, handle: &dyn PageHandle);
}

/// Scoped page acquisition: the page is closed when the session drops
pub struct PageSession {
    source: Arc<dyn PageSource>,
    handle: Box<dyn PageHandle>,
}

impl PageSession {
    /// Opens a page and suppresses automation markers on it
    pub async fn open(
        source: Arc<dyn PageSource>,
        url: &str,
        mode: RenderMode,
    ) -> crate::Result<Self> {
        let handle = source.open(url, mode).await?;
        suppress_automation_markers(handle.as_ref());
        Ok(Self { source, handle })
    }

    /// The open page
    pub fn page(&self) -> &dyn PageHandle {
        self.handle.as_ref()
    }
}

impl Drop for PageSession {
    fn drop(&mut self) {
        tracing::trace!("Closing page {}", self.handle.url());
        self.source.close(self.handle.as_ref());
    }
}

/// Hides `navigator.webdriver` on the page
///
/// Engines without a script runtime report nothing; failures are only logged.
pub fn suppress_automation_markers(page: &dyn PageHandle) {
    if let Err(e) = page.evaluate_script(AUTOMATION_MARKER_SCRIPT) {
        tracing::debug!("Could not suppress automation markers on {}: {}", page.url(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_closes_page_on_drop() {
        let source = Arc::new(
            InMemoryPageSource::new().with_page("https://site.io/a", "<html><body></body></html>"),
        );

        {
            let session = PageSession::open(source.clone(), "https://site.io/a", RenderMode::Headless)
                .await
                .unwrap();
            assert_eq!(session.page().url(), "https://site.io/a");
            assert_eq!(source.open_pages(), 1);
        }

        assert_eq!(source.open_pages(), 0);
    }

    #[tokio::test]
    async fn test_failed_open_leaves_nothing_open() {
        let source = Arc::new(InMemoryPageSource::new().with_timeout("https://site.io/slow"));

        let result = PageSession::open(source.clone(), "https://site.io/slow", RenderMode::Headless).await;

        assert!(matches!(
            result,
            Err(crate::SwatchError::NavigationTimeout { .. })
        ));
        assert_eq!(source.open_pages(), 0);
    }

    #[test]
    fn test_render_mode_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: RenderMode,
        }
        let parsed: Wrapper = toml::from_str("mode = \"windowed\"").unwrap();
        assert_eq!(parsed.mode, RenderMode::Windowed);
        assert_eq!(RenderMode::default(), RenderMode::Headless);
    }
}
