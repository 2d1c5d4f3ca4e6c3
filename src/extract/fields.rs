//! Strategy chains for the fields of a detail page

use super::strategy::{non_blank, FallbackChain};
use crate::page::{ElementId, PageHandle, Scope};
use crate::url::author_from_url;

/// Author nickname, DOM first, then the URL's first path segment
pub fn author_chain() -> FallbackChain<String> {
    let mut chain = FallbackChain::new("author");
    for (name, selector) in [
        ("nickname", "div.card__nickname"),
        ("nickname-class", "[class*='card__nickname']"),
        ("nickname-colored", ".card__nickname.text-color"),
        ("nickname-flex", "div.card__nickname.text-color.flex.items-center"),
        ("nickname-link", "[class*='card__nickname'] a"),
    ] {
        chain = chain.then(name, move |page, scope| {
            page.query_one(scope, selector)
                .and_then(|e| non_blank(page.read_text(e).trim().trim_start_matches('@')))
        });
    }
    chain.then("url-path", |page, _| author_from_url(page.url()))
}

/// Activatable tab control for `key` (`html`, `css`)
pub fn tab_chain(key: &str) -> FallbackChain<ElementId> {
    let trigger = format!("button[role='tab'][id*='trigger-{}']", key);
    let label = key.to_uppercase();
    let exact = label.clone();
    let contains = label.clone();

    FallbackChain::new("tab")
        .then("trigger-id", move |page, scope| page.query_one(scope, &trigger))
        .then("exact-label", move |page, scope| {
            find_tab(page, scope, "button[role='tab']", |text| text == exact)
        })
        .then("label-contains", move |page, scope| {
            find_tab(page, scope, "button[role='tab']", |text| text.contains(&contains))
        })
        .then("any-tab-contains", move |page, scope| {
            find_tab(page, scope, "a[role='tab'], button[role='tab']", |text| {
                text.contains(&label)
            })
        })
}

/// Code inside a tab panel
///
/// `element_id` is the editor's stable id for this tab; `editor_class` the class
/// signature shared by editor textareas.
pub fn panel_code_chain(field: &'static str, element_id: &str, editor_class: &str) -> FallbackChain<String> {
    let by_id = format!("[id='{}']", element_id);
    let editor = format!("textarea.{}", editor_class);

    FallbackChain::new(field)
        .then("element-id", move |page, scope| {
            page.query_one(scope, &by_id)
                .and_then(|e| page.read_value(e))
                .and_then(non_blank)
        })
        .then("editor-textarea", move |page, scope| {
            first_non_blank(page, scope, &editor, |page, e| page.read_value(e))
        })
        .then("pre-code", |page, scope| {
            first_non_blank(page, scope, "pre code", |page, e| Some(page.read_text(e)))
        })
        .then("contenteditable", |page, scope| {
            first_non_blank(page, scope, "[contenteditable='true']", |page, e| {
                Some(page.read_text(e))
            })
        })
}

fn find_tab(
    page: &dyn PageHandle,
    scope: Scope,
    selector: &str,
    accept: impl Fn(&str) -> bool,
) -> Option<ElementId> {
    page.query_all(scope, selector).into_iter().find(|&tab| {
        let text = normalize_space(&page.read_text(tab));
        accept(&text.to_uppercase())
    })
}

fn first_non_blank(
    page: &dyn PageHandle,
    scope: Scope,
    selector: &str,
    read: impl Fn(&dyn PageHandle, ElementId) -> Option<String>,
) -> Option<String> {
    page.query_all(scope, selector)
        .into_iter()
        .find_map(|e| read(page, e).and_then(non_blank))
}

fn normalize_space(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::StaticPage;

    #[test]
    fn test_author_strips_at_sign() {
        let page = StaticPage::new(
            "https://site.io/alice/glow-1",
            "<div class='card__nickname text-color'> @bob </div>",
        );
        let hit = author_chain().run(&page, Scope::Document).unwrap();
        assert_eq!(hit.value, "bob");
        assert_eq!(hit.strategy, "nickname");
    }

    #[test]
    fn test_author_falls_back_to_url() {
        let page = StaticPage::new("https://site.io/alice/glow-1", "<p>nothing here</p>");
        let hit = author_chain().run(&page, Scope::Document).unwrap();
        assert_eq!(hit.value, "alice");
        assert_eq!(hit.strategy, "url-path");
    }

    #[test]
    fn test_tab_by_label_when_no_trigger_id() {
        let page = StaticPage::new(
            "https://site.io/a/b-1",
            r#"<button role="tab" id="x1">  html </button><button role="tab" id="x2">CSS code</button>"#,
        );

        let html = tab_chain("html").run(&page, Scope::Document).unwrap();
        let css = tab_chain("css").run(&page, Scope::Document).unwrap();

        assert_eq!(html.strategy, "exact-label");
        assert_eq!(css.strategy, "label-contains");
        assert_eq!(page.attribute(css.value, "id").as_deref(), Some("x2"));
    }

    #[test]
    fn test_tab_by_trigger_id() {
        let page = StaticPage::new(
            "https://site.io/a/b-1",
            r#"<button role="tab" id="radix-1-trigger-css">Styles</button>"#,
        );
        let hit = tab_chain("css").run(&page, Scope::Document).unwrap();
        assert_eq!(hit.strategy, "trigger-id");
    }

    #[test]
    fn test_panel_strategies_in_order() {
        let page = StaticPage::new(
            "https://site.io/a/b-1",
            r#"
<div id="p1"><textarea id="codeArea2">  </textarea><pre><code>from pre</code></pre></div>
<div id="p2"><div contenteditable="true">editable</div></div>
"#,
        );
        let chain = panel_code_chain("markup", "codeArea2", "npm__react-simple-code-editor__textarea");

        let p1 = page.element_by_id("p1").unwrap();
        let p2 = page.element_by_id("p2").unwrap();

        let hit = chain.run(&page, Scope::Within(p1)).unwrap();
        assert_eq!((hit.value.as_str(), hit.strategy), ("from pre", "pre-code"));

        let hit = chain.run(&page, Scope::Within(p2)).unwrap();
        assert_eq!((hit.value.as_str(), hit.strategy), ("editable", "contenteditable"));
    }
}
