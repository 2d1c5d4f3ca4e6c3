//! Document normalizer
//!
//! Reconciles a captured markup/style pair into one self-contained preview document:
//! 1. Decode entities and trim both sides
//! 2. Move markup that is really a style sheet over to the style side
//! 3. Unwrap complete documents down to their body content
//! 4. Synthesize demonstrative markup when only styling survived
//! 5. Normalize whitespace on both sides
//! 6. Wrap everything in a fixed document template

mod entities;

pub use entities::unescape;

use crate::extract::RawExtraction;
use crate::url::humanize_slug;
use regex::Regex;
use std::sync::OnceLock;

/// Title of every generated preview document
pub const PREVIEW_TITLE: &str = "Component Preview";

/// Baseline reset appended after the captured style
const BASELINE_RESET: &str = "html, body { margin:0; padding:16px; }";

fn style_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^[^{]*\{[\s\S]*\}[\s\S]*$").expect("valid style block regex"))
}

fn body_inner() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<body[^>]*>(.*?)</body>").expect("valid body regex"))
}

fn first_class_selector() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.([A-Za-z_][\w-]*)\s*\{").expect("valid class selector regex"))
}

fn button_like() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)btn|button").expect("valid button regex"))
}

fn trailing_blanks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]+\n").expect("valid whitespace regex"))
}

/// A component ready for the sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDocument {
    pub natural_key: String,
    pub display_name: String,
    /// Complete preview document (doctype, head and body)
    pub combined_markup: String,
    pub library: String,
    pub source_url: String,
    pub author: Option<String>,
    pub category: String,
    pub license: Option<String>,
}

impl NormalizedDocument {
    /// Normalizes a raw capture into a document for `library`/`category`
    ///
    /// The display name is humanized from the natural key.
    pub fn from_extraction(raw: &RawExtraction, library: &str, category: &str) -> Self {
        Self {
            natural_key: raw.natural_key.clone(),
            display_name: humanize_slug(&raw.natural_key),
            combined_markup: normalize(&raw.markup_raw, &raw.style_raw),
            library: library.to_string(),
            source_url: raw.source_url.clone(),
            author: Some(raw.author.trim())
                .filter(|a| !a.is_empty())
                .map(str::to_string),
            category: category.to_string(),
            license: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_license(mut self, license: Option<String>) -> Self {
        self.license = license;
        self
    }
}

/// Markup and style after reconciliation, before wrapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciledParts {
    pub markup: String,
    pub style: String,
}

/// Builds the complete preview document for a markup/style pair
///
/// The result is always a full document; whenever either input is non-empty its
/// body is non-empty too.
///
/// # Examples
///
/// ```
/// use swatchbook::normalize;
///
/// let doc = normalize("", ".btn-fancy { border-radius: 8px; }");
/// assert!(doc.starts_with("<!DOCTYPE html>"));
/// assert!(doc.contains(r#"<button class="btn-fancy">Button</button>"#));
/// ```
pub fn normalize(markup_raw: &str, style_raw: &str) -> String {
    let had_input = !markup_raw.trim().is_empty() || !style_raw.trim().is_empty();
    let mut parts = reconcile(markup_raw, style_raw);

    // Unwrapping an empty body or discarding a stray sheet can leave nothing to show
    if had_input && parts.markup.is_empty() && parts.style.is_empty() {
        parts.markup = "<button>Button</button>".to_string();
    }

    build_document(&parts)
}

/// Applies decoding, reclassification, unwrapping, synthesis and whitespace cleanup
pub fn reconcile(markup_raw: &str, style_raw: &str) -> ReconciledParts {
    let mut markup = clean_piece(markup_raw);
    let mut style = clean_piece(style_raw);

    if looks_style_only(&markup) {
        style = format!("{}\n{}", markup, style).trim().to_string();
        markup.clear();
    }

    let markup = normalize_whitespace(&body_content(&markup));
    let style = normalize_whitespace(&style);

    let markup = if markup.is_empty() && !style.is_empty() {
        synthesize_markup(&style)
    } else {
        markup
    };

    ReconciledParts { markup, style }
}

/// Wraps reconciled parts into the fixed document template
pub fn build_document(parts: &ReconciledParts) -> String {
    format!(
        "<!DOCTYPE html>\n\
<html lang=\"en\">\n\
<head>\n\
<meta charset=\"utf-8\" />\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n\
<title>{title}</title>\n\
<style>\n\
{style}\n\
{reset}\n\
</style>\n\
</head>\n\
<body>\n\
{markup}\n\
</body>\n\
</html>",
        title = PREVIEW_TITLE,
        style = parts.style,
        reset = BASELINE_RESET,
        markup = parts.markup,
    )
}

/// Returns true if `text` has a `selector { ... }` block and no tag markers
pub fn looks_style_only(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() || (text.contains('<') && text.contains('>')) {
        return false;
    }
    style_block().is_match(text)
}

/// Returns true if `text` is a whole document rather than a fragment
pub fn is_complete_document(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    lower.contains("<!doctype") || lower.contains("<html") || lower.contains("<body")
}

/// Entity decoding plus a second pass for the common escapes, then trimming
///
/// Double-escaped input such as `&amp;lt;` comes out as `<`.
fn clean_piece(text: &str) -> String {
    unescape(text)
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// Reduces markup to what belongs inside `<body>`
fn body_content(markup: &str) -> String {
    let markup = markup.trim();
    if markup.is_empty() || looks_style_only(markup) {
        return String::new();
    }

    if is_complete_document(markup) {
        return body_inner()
            .captures(markup)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
    }

    markup.to_string()
}

fn synthesize_markup(style: &str) -> String {
    let class = first_class_selector()
        .captures(style)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str());

    match class {
        Some(class) if button_like().is_match(class) => {
            format!("<button class=\"{}\">Button</button>", class)
        }
        Some(class) => format!("<div class=\"{}\">Preview</div>", class),
        None => "<button>Button</button>".to_string(),
    }
}

fn normalize_whitespace(text: &str) -> String {
    trailing_blanks().replace_all(text, "\n").trim().to_string()
}
