//! Link discovery on listing pages
//!
//! A listing page is scrolled in fixed steps so lazily loaded cards render, then its
//! anchors are collected in tiers:
//! 1. anchors whose text contains the call-to-action phrase
//! 2. anchors carrying the discoverable-link attribute
//! 3. only when tiers 1 and 2 found nothing, every rooted anchor
//!
//! Every candidate must have the detail-page slug shape. Results are absolute URLs on
//! the listing's origin, deduplicated and sorted.

use crate::config::ListingConfig;
use crate::page::{PageHandle, PageSession, PageSource, RenderMode, Scope};
use crate::url::{origin_of, rooted_path, SlugShape};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Discovers detail links on listing pages
pub struct LinkDiscovery {
    cta_phrase: String,
    discover_attribute: String,
    shape: SlugShape,
    scroll_steps: u32,
    scroll_step_px: u32,
    scroll_delay: Duration,
    mode: RenderMode,
}

impl LinkDiscovery {
    /// Builds discovery from listing settings
    ///
    /// The detail pattern has already been validated with the configuration; an
    /// invalid one falls back to the default slug shape.
    pub fn new(listing: &ListingConfig, mode: RenderMode) -> Self {
        let shape = SlugShape::new(&listing.detail_pattern).unwrap_or_else(|e| {
            tracing::warn!("Invalid detail pattern, using default: {}", e);
            SlugShape::default()
        });

        Self {
            cta_phrase: listing.cta_phrase.to_lowercase(),
            discover_attribute: listing.discover_attribute.clone(),
            shape,
            scroll_steps: listing.scroll_steps,
            scroll_step_px: listing.scroll_step_px,
            scroll_delay: Duration::from_millis(listing.scroll_delay_ms),
            mode,
        }
    }

    /// Opens `listing_url` and returns its detail links
    ///
    /// A listing page that cannot be opened yields an empty set, like a page
    /// without matches.
    pub async fn discover(&self, source: Arc<dyn PageSource>, listing_url: &str) -> BTreeSet<String> {
        let session = match PageSession::open(source, listing_url, self.mode).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Listing page {} could not be opened: {}", listing_url, e);
                return BTreeSet::new();
            }
        };

        self.scroll(session.page()).await;
        self.collect(session.page())
    }

    /// Scrolls down in fixed steps, then back to the top
    pub async fn scroll(&self, page: &dyn PageHandle) {
        let step = format!("window.scrollBy(0, {});", self.scroll_step_px);
        for _ in 0..self.scroll_steps {
            if let Err(e) = page.evaluate_script(&step) {
                tracing::debug!("Scroll step failed on {}: {}", page.url(), e);
                break;
            }
            tokio::time::sleep(self.scroll_delay).await;
        }
        if let Err(e) = page.evaluate_script("window.scrollTo(0, 0);") {
            tracing::debug!("Scroll reset failed on {}: {}", page.url(), e);
        }
    }

    /// Collects detail links from the current DOM
    pub fn collect(&self, page: &dyn PageHandle) -> BTreeSet<String> {
        let Some(origin) = origin_of(page.url()) else {
            tracing::warn!("Listing URL {} has no origin", page.url());
            return BTreeSet::new();
        };

        let anchors = page.query_all(Scope::Document, "a[href]");

        let cta: Vec<_> = anchors
            .iter()
            .copied()
            .filter(|&a| page.read_text(a).to_lowercase().contains(&self.cta_phrase))
            .collect();
        let marked = page.query_all(
            Scope::Document,
            &format!("a[{}='true'][href]", self.discover_attribute),
        );

        let mut links = self.detail_links(page, &origin, cta.into_iter().chain(marked));
        if links.is_empty() {
            tracing::debug!("No tagged anchors on {}, scanning all rooted links", page.url());
            links = self.detail_links(page, &origin, anchors.into_iter());
        }

        tracing::debug!("Discovered {} links on {}", links.len(), page.url());
        links
    }

    fn detail_links(
        &self,
        page: &dyn PageHandle,
        origin: &str,
        anchors: impl Iterator<Item = crate::page::ElementId>,
    ) -> BTreeSet<String> {
        anchors
            .filter_map(|a| page.attribute(a, "href"))
            .filter(|href| same_origin_or_rooted(href, origin))
            .filter_map(|href| rooted_path(&href))
            .filter(|path| self.shape.matches(path))
            .map(|path| format!("{}{}", origin, path))
            .collect()
    }
}

fn same_origin_or_rooted(href: &str, origin: &str) -> bool {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        origin_of(href).as_deref() == Some(origin)
    } else {
        true
    }
}
