use regex::Regex;
use std::sync::OnceLock;

/// Fallback key for URLs whose final segment is empty after cleaning
const FALLBACK_KEY: &str = "component";

fn non_slug_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]+").expect("valid slug regex"))
}

fn trailing_id() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-\d+$").expect("valid id regex"))
}

/// Derives the natural key of a source URL
///
/// The key is the URL's final non-empty path segment, lowercased, with every run of
/// characters outside `[A-Za-z0-9_]` collapsed to a single `-` and outer dashes
/// trimmed. Query strings and fragments never contribute, so two URLs sharing a path
/// tail share a key.
///
/// # Examples
///
/// ```
/// use swatchbook::url::natural_key;
///
/// assert_eq!(natural_key("https://site.io/alice/Glow-Button-42/"), "glow-button-42");
/// assert_eq!(natural_key("/bob/glow-button-42?ref=home"), "glow-button-42");
/// ```
pub fn natural_key(source_url: &str) -> String {
    let tail = final_segment(source_url);
    slugify(tail)
}

/// Builds a natural key from several parts (owner, repository, file path)
pub fn natural_key_from_parts(parts: &[&str]) -> String {
    let joined = parts
        .iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    slugify(&joined)
}

/// Turns a slug into a human display name
///
/// A trailing numeric id is dropped and the remaining words are capitalised:
/// `glow-button-42` becomes `Glow Button`.
pub fn humanize_slug(slug: &str) -> String {
    let stripped = trailing_id().replace(slug, "");
    let words: Vec<String> = stripped
        .replace('_', "-")
        .split('-')
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect();

    if words.is_empty() {
        "Component".to_string()
    } else {
        words.join(" ")
    }
}

fn slugify(text: &str) -> String {
    let collapsed = non_slug_chars().replace_all(text, "-");
    let key = collapsed.trim_matches('-').to_lowercase();
    if key.is_empty() {
        FALLBACK_KEY.to_string()
    } else {
        key
    }
}

fn final_segment(source_url: &str) -> &str {
    // Absolute URLs: drop scheme and host so the host never becomes the tail
    let without_scheme = match source_url.find("://") {
        Some(idx) => {
            let rest = &source_url[idx + 3..];
            rest.find('/').map(|slash| &rest[slash..]).unwrap_or("")
        }
        None => source_url,
    };
    let path = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or(without_scheme);

    path.split('/')
        .filter(|s| !s.is_empty())
        .last()
        .unwrap_or("")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
