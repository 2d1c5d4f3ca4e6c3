use super::{PageHandle, PageSource, RenderMode, StaticPage};
use crate::{Result, SwatchError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Serves fixed documents by URL
///
/// Unknown URLs answer as HTTP 404; URLs registered with
/// [`InMemoryPageSource::with_timeout`] fail as navigation timeouts. Every open is
/// recorded so callers can check which pages were visited and that all were closed.
#[derive(Debug, Default)]
pub struct InMemoryPageSource {
    pages: HashMap<String, String>,
    timeouts: HashSet<String>,
    opened: Mutex<Vec<String>>,
    live: AtomicUsize,
}

impl InMemoryPageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a document for `url`
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    /// Makes every open of `url` time out
    pub fn with_timeout(mut self, url: impl Into<String>) -> Self {
        self.timeouts.insert(url.into());
        self
    }

    /// URLs opened so far, in order
    pub fn opened(&self) -> Vec<String> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of pages currently open
    pub fn open_pages(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for InMemoryPageSource {
    async fn open(&self, url: &str, _mode: RenderMode) -> Result<Box<dyn PageHandle>> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());

        if self.timeouts.contains(url) {
            return Err(SwatchError::NavigationTimeout {
                url: url.to_string(),
                waited_secs: 0,
            });
        }

        match self.pages.get(url) {
            Some(html) => {
                self.live.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(StaticPage::new(url, html.clone())))
            }
            None => Err(SwatchError::NavigationStatus {
                url: url.to_string(),
                status: 404,
            }),
        }
    }

    fn close(&self, _handle: &dyn PageHandle) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}
