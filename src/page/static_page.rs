//! Static DOM page
//!
//! Queries a fetched HTML document with `scraper`. The parsed tree is not `Send`,
//! so the page keeps the raw body and parses per operation; elements are addressed
//! by their index in document order, which is stable across parses of the same body.

use super::{ElementId, PageError, PageHandle, Scope};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// A page backed by a fixed HTML body
#[derive(Debug)]
pub struct StaticPage {
    url: String,
    body: String,
    /// Tab element last clicked, if any
    active_tab: Mutex<Option<ElementId>>,
}

impl StaticPage {
    /// Creates a page for `url` with the given HTML body
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
            active_tab: Mutex::new(None),
        }
    }

    /// Raw HTML body
    pub fn body(&self) -> &str {
        &self.body
    }

    fn with_elements<R, F>(&self, f: F) -> R
    where
        F: for<'a, 'b> FnOnce(&'b [ElementRef<'a>]) -> R,
    {
        let document = Html::parse_document(&self.body);
        let elements: Vec<ElementRef<'_>> = document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .collect();
        f(&elements)
    }

    fn with_element<R, F>(&self, element: ElementId, f: F) -> Option<R>
    where
        F: for<'a> FnOnce(ElementRef<'a>) -> R,
    {
        self.with_elements(|elements| elements.get(element.0).copied().map(f))
    }

    fn active_tab(&self) -> Option<ElementId> {
        *self.active_tab.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn is_tab(element: &ElementRef<'_>) -> bool {
    element.value().attr("role") == Some("tab")
}

impl PageHandle for StaticPage {
    fn url(&self) -> &str {
        &self.url
    }

    fn query_all(&self, scope: Scope, selector: &str) -> Vec<ElementId> {
        let Ok(selector) = Selector::parse(selector) else {
            tracing::trace!("Ignoring unparseable selector {:?}", selector);
            return Vec::new();
        };

        self.with_elements(|elements| {
            let index: HashMap<_, usize> = elements
                .iter()
                .enumerate()
                .map(|(i, e)| (e.id(), i))
                .collect();

            let matches: Vec<ElementRef<'_>> = match scope {
                Scope::Document => elements
                    .iter()
                    .filter(|e| selector.matches(e))
                    .copied()
                    .collect(),
                Scope::Within(root) => match elements.get(root.0) {
                    Some(root) => root.select(&selector).filter(|e| e.id() != root.id()).collect(),
                    None => Vec::new(),
                },
            };

            matches
                .iter()
                .filter_map(|e| index.get(&e.id()).copied().map(ElementId))
                .collect()
        })
    }

    fn element_by_id(&self, id: &str) -> Option<ElementId> {
        self.with_elements(|elements| {
            elements
                .iter()
                .position(|e| e.value().id() == Some(id))
                .map(ElementId)
        })
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        let active = self.active_tab();
        self.with_element(element, |e| {
            // A clicked tab flips the reported state of every tab on the page
            if let Some(active) = active {
                if is_tab(&e) {
                    match name {
                        "data-state" => {
                            let state = if active == element { "active" } else { "inactive" };
                            return Some(state.to_string());
                        }
                        "aria-selected" => return Some((active == element).to_string()),
                        _ => {}
                    }
                }
            }
            e.value().attr(name).map(str::to_string)
        })
        .flatten()
    }

    fn read_value(&self, element: ElementId) -> Option<String> {
        self.with_element(element, |e| match e.value().name() {
            "textarea" => Some(e.text().collect::<String>()),
            _ => e.value().attr("value").map(str::to_string),
        })
        .flatten()
    }

    fn read_text(&self, element: ElementId) -> String {
        self.with_element(element, |e| e.text().collect::<String>())
            .unwrap_or_default()
    }

    fn click(&self, element: ElementId) -> Result<(), PageError> {
        let tab = self
            .with_element(element, |e| is_tab(&e))
            .ok_or(PageError::ElementGone(element))?;

        if tab {
            *self.active_tab.lock().unwrap_or_else(PoisonError::into_inner) = Some(element);
        }
        Ok(())
    }

    fn evaluate_script(&self, _script: &str) -> Result<Option<String>, PageError> {
        // No script runtime on a static document
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABS: &str = r#"
<html><body>
  <div role="tablist">
    <button role="tab" id="t-trigger-html" data-state="active" aria-controls="p-html">HTML</button>
    <button role="tab" id="t-trigger-css" data-state="inactive" aria-controls="p-css">CSS</button>
  </div>
  <div id="p-html"><textarea id="codeArea2">&lt;button&gt;Hi&lt;/button&gt;</textarea></div>
  <div id="p-css"><pre><code>.btn { color: red; }</code></pre></div>
  <input id="field" value="typed">
</body></html>
"#;

    #[test]
    fn test_query_in_document_order() {
        let page = StaticPage::new("https://site.io/a/b-1", TABS);
        let tabs = page.query_all(Scope::Document, "button[role='tab']");
        assert_eq!(tabs.len(), 2);
        assert!(tabs[0].0 < tabs[1].0);
        assert_eq!(page.read_text(tabs[1]), "CSS");
    }

    #[test]
    fn test_scoped_query_stays_inside_panel() {
        let page = StaticPage::new("https://site.io/a/b-1", TABS);
        let css_panel = page.element_by_id("p-css").unwrap();
        let html_panel = page.element_by_id("p-html").unwrap();

        assert!(page.query_one(Scope::Within(css_panel), "pre code").is_some());
        assert!(page.query_one(Scope::Within(html_panel), "pre code").is_none());
    }

    #[test]
    fn test_click_moves_active_tab_state() {
        let page = StaticPage::new("https://site.io/a/b-1", TABS);
        let html_tab = page.element_by_id("t-trigger-html").unwrap();
        let css_tab = page.element_by_id("t-trigger-css").unwrap();

        assert_eq!(page.attribute(css_tab, "data-state").as_deref(), Some("inactive"));
        page.click(css_tab).unwrap();
        assert_eq!(page.attribute(css_tab, "data-state").as_deref(), Some("active"));
        assert_eq!(page.attribute(html_tab, "data-state").as_deref(), Some("inactive"));
        assert_eq!(page.attribute(css_tab, "aria-controls").as_deref(), Some("p-css"));
    }

    #[test]
    fn test_read_value_of_controls() {
        let page = StaticPage::new("https://site.io/a/b-1", TABS);
        let area = page.element_by_id("codeArea2").unwrap();
        let field = page.element_by_id("field").unwrap();

        assert_eq!(page.read_value(area).as_deref(), Some("<button>Hi</button>"));
        assert_eq!(page.read_value(field).as_deref(), Some("typed"));
    }

    #[test]
    fn test_invalid_selector_and_missing_element() {
        let page = StaticPage::new("https://site.io/a/b-1", TABS);
        assert!(page.query_all(Scope::Document, "button[[").is_empty());
        assert!(matches!(
            page.click(ElementId(10_000)),
            Err(PageError::ElementGone(_))
        ));
        assert_eq!(page.read_text(ElementId(10_000)), "");
    }
}
