//! Selector fallback extractor
//!
//! Reads the author, markup and style of a detail page. Every field is an ordered
//! [`FallbackChain`] of strategies. Code fields go through their tab: the tab is
//! activated, its panel resolved through `aria-controls`, and panel strategies run
//! scoped to that panel only. A document-wide scan backs up whichever field is
//! still empty afterwards.

mod fields;
mod sniff;
mod strategy;

pub use fields::{author_chain, panel_code_chain, tab_chain};
pub use sniff::{backup_scan, looks_like_markup, looks_like_style};
pub use strategy::{non_blank, Candidate, FallbackChain, Hit, Strategy};

use crate::config::{BrowserConfig, ExtractConfig};
use crate::page::{ElementId, PageHandle, Scope};
use crate::url::natural_key;
use std::time::Duration;

/// Consent and modal buttons dismissed before reading a page
const OVERLAY_SELECTORS: &[&str] = &[
    "div[class*='cookie'] button",
    "div[class*='modal'] button",
];

/// Labels of consent buttons, matched case-sensitively as on the page
const OVERLAY_LABELS: &[&str] = &["Accept", "I agree", "Got it", "확인"];

/// What a detail page yielded, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawExtraction {
    pub natural_key: String,
    pub markup_raw: String,
    pub style_raw: String,
    pub author: String,
    pub source_url: String,
}

impl RawExtraction {
    /// Returns true if neither code field was captured
    pub fn is_empty(&self) -> bool {
        self.markup_raw.trim().is_empty() && self.style_raw.trim().is_empty()
    }
}

/// Tab one code field is read from
struct CodeTab {
    tab: FallbackChain<ElementId>,
    code: FallbackChain<String>,
}

/// Extracts components from detail pages
pub struct Extractor {
    author: FallbackChain<String>,
    markup: CodeTab,
    style: CodeTab,
    editor_class: String,
    poll_retries: u32,
    poll_delay: Duration,
}

impl Extractor {
    pub fn new(extract: &ExtractConfig, browser: &BrowserConfig) -> Self {
        Self {
            author: author_chain(),
            markup: CodeTab {
                tab: tab_chain(&extract.markup_tab),
                code: panel_code_chain("markup", &extract.markup_element_id, &extract.editor_class),
            },
            style: CodeTab {
                tab: tab_chain(&extract.style_tab),
                code: panel_code_chain("style", &extract.style_element_id, &extract.editor_class),
            },
            editor_class: extract.editor_class.clone(),
            poll_retries: browser.tab_poll_retries,
            poll_delay: Duration::from_millis(browser.tab_poll_delay_ms),
        }
    }

    /// Extracts the component on `page`
    ///
    /// Missing elements never fail the extraction; an empty result is reported
    /// through [`RawExtraction::is_empty`].
    pub async fn extract(&self, page: &dyn PageHandle) -> RawExtraction {
        dismiss_overlays(page);

        let author = self
            .author
            .run(page, Scope::Document)
            .map(|hit| hit.value)
            .unwrap_or_default();

        let markup_panel = self.open_panel(page, &self.markup.tab).await;
        let style_panel = self.open_panel(page, &self.style.tab).await;

        let mut markup = read_panel(page, markup_panel, &self.markup.code);
        let mut style = read_panel(page, style_panel, &self.style.code);

        if markup.is_empty() || style.is_empty() {
            tracing::debug!("Running document backup scan on {}", page.url());
            backup_scan(page, &self.editor_class, &mut markup, &mut style);
        }

        RawExtraction {
            natural_key: natural_key(page.url()),
            markup_raw: markup,
            style_raw: style,
            author,
            source_url: page.url().to_string(),
        }
    }

    /// Activates the tab found by `chain` and resolves the panel it controls
    async fn open_panel(
        &self,
        page: &dyn PageHandle,
        chain: &FallbackChain<ElementId>,
    ) -> Option<ElementId> {
        let tab = chain.run(page, Scope::Document)?.value;
        self.activate(page, tab).await;

        let panel_id = page
            .attribute(tab, "aria-controls")
            .filter(|id| !id.is_empty())?;
        let panel = page.element_by_id(&panel_id);
        if panel.is_none() {
            tracing::debug!("Tab panel {} missing on {}", panel_id, page.url());
        }
        panel
    }

    /// Clicks `tab` and polls until it reports the active state
    async fn activate(&self, page: &dyn PageHandle, tab: ElementId) {
        if let Err(e) = page.click(tab) {
            tracing::debug!("Tab click failed on {}: {}", page.url(), e);
            return;
        }
        tokio::time::sleep(self.poll_delay).await;

        for _ in 0..self.poll_retries {
            if is_active(page, tab) {
                return;
            }
            if page.click(tab).is_err() {
                return;
            }
            tokio::time::sleep(self.poll_delay).await;
        }
    }
}

fn is_active(page: &dyn PageHandle, tab: ElementId) -> bool {
    page.attribute(tab, "data-state")
        .is_some_and(|state| state.eq_ignore_ascii_case("active"))
}

fn read_panel(page: &dyn PageHandle, panel: Option<ElementId>, chain: &FallbackChain<String>) -> String {
    panel
        .and_then(|panel| chain.run(page, Scope::Within(panel)))
        .map(|hit| hit.value)
        .unwrap_or_default()
}

fn is_overlay_label(text: &str) -> bool {
    OVERLAY_LABELS.iter().any(|label| text.contains(label))
}

/// Best-effort dismissal of consent banners and modals
pub fn dismiss_overlays(page: &dyn PageHandle) {
    let labelled = page
        .query_all(Scope::Document, "button")
        .into_iter()
        .find(|&button| is_overlay_label(&page.read_text(button)));

    let targets = labelled.into_iter().chain(
        OVERLAY_SELECTORS
            .iter()
            .filter_map(|selector| page.query_one(Scope::Document, selector)),
    );

    for target in targets {
        if let Err(e) = page.click(target) {
            tracing::trace!("Overlay click ignored on {}: {}", page.url(), e);
        }
    }
}
