//! Content sniffing for the whole-document backup scan

use crate::normalize::unescape;
use crate::page::{PageHandle, Scope};

/// How far into a candidate a `{` disqualifies it as markup
const MARKUP_BRACE_WINDOW: usize = 200;

/// Markup: has `<` and `>` and no `{` in its first 200 characters (after decoding)
pub fn looks_like_markup(text: &str) -> bool {
    let decoded = unescape(text);
    decoded.contains('<')
        && decoded.contains('>')
        && !decoded.chars().take(MARKUP_BRACE_WINDOW).any(|c| c == '{')
}

/// Style: has `{` and `}` and no closing-tag token
pub fn looks_like_style(text: &str) -> bool {
    text.contains('{') && text.contains('}') && !text.contains("</")
}

/// Fills whichever of `markup`/`style` is still empty from document-wide candidates
///
/// Editor textareas are scanned first, then preformatted code blocks. Each
/// candidate can fill both fields; the scan stops once both are set.
pub fn backup_scan(page: &dyn PageHandle, editor_class: &str, markup: &mut String, style: &mut String) {
    let editors: Vec<String> = page
        .query_all(Scope::Document, &format!("textarea.{}", editor_class))
        .into_iter()
        .filter_map(|e| page.read_value(e))
        .collect();
    if classify_into(editors, markup, style) {
        return;
    }

    let blocks: Vec<String> = page
        .query_all(Scope::Document, "pre code")
        .into_iter()
        .map(|e| page.read_text(e))
        .collect();
    classify_into(blocks, markup, style);
}

/// Returns true once both fields are filled
fn classify_into(candidates: Vec<String>, markup: &mut String, style: &mut String) -> bool {
    for candidate in candidates {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            continue;
        }
        if markup.is_empty() && looks_like_markup(candidate) {
            *markup = candidate.to_string();
        }
        if style.is_empty() && looks_like_style(candidate) {
            *style = candidate.to_string();
        }
        if !markup.is_empty() && !style.is_empty() {
            return true;
        }
    }
    false
}
