use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Default detail-page shape: `/<author>/<slug>-<digits>`
pub const DEFAULT_DETAIL_PATTERN: &str = r"^/[A-Za-z0-9-]+/[A-Za-z0-9-]+-\d+$";

/// Matcher for left-rooted detail paths
#[derive(Debug, Clone)]
pub struct SlugShape {
    pattern: Regex,
}

impl SlugShape {
    /// Compiles a slug-shape pattern
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// Returns true if the rooted path has the detail-page shape
    pub fn matches(&self, rooted_path: &str) -> bool {
        self.pattern.is_match(rooted_path)
    }
}

fn default_detail_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DEFAULT_DETAIL_PATTERN).expect("valid detail pattern"))
}

impl Default for SlugShape {
    fn default() -> Self {
        Self {
            pattern: default_detail_shape().clone(),
        }
    }
}

/// Converts an href into a left-rooted path
///
/// Absolute HTTP(S) hrefs keep only their path (and query); hrefs that already start
/// with `/` are returned as is. Anything else (relative paths, fragments, other
/// schemes, protocol-relative `//host` links) yields `None`.
pub fn rooted_path(href: &str) -> Option<String> {
    let href = href.trim();

    if href.starts_with("http://") || href.starts_with("https://") {
        let url = Url::parse(href).ok()?;
        let mut rooted = url.path().to_string();
        if let Some(query) = url.query() {
            rooted.push('?');
            rooted.push_str(query);
        }
        return Some(rooted);
    }

    if href.starts_with('/') && !href.starts_with("//") {
        return Some(href.to_string());
    }

    None
}

/// Returns the scheme + host (+ port) of a URL, without a trailing slash
pub fn origin_of(url: &str) -> Option<String> {
    let origin = Url::parse(url).ok()?.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

/// Reads the author from a detail URL of the form `<origin>/<author>/<slug>`
///
/// Returns `None` when the path has fewer than two segments.
pub fn author_from_url(detail_url: &str) -> Option<String> {
    let path = match Url::parse(detail_url) {
        Ok(url) => url.path().to_string(),
        Err(_) => detail_url.to_string(),
    };

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() >= 2 {
        Some(segments[0].to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_shape_matches_detail_paths() {
        let shape = SlugShape::default();
        assert!(shape.matches("/alice/glow-button-42"));
        assert!(shape.matches("/Bob-2/card-7"));

        assert!(!shape.matches("/alice/glow-button"));
        assert!(!shape.matches("/buttons"));
        assert!(!shape.matches("/alice/glow-button-42/extra"));
        assert!(!shape.matches("/alice/glow-button-42?x=1"));
        assert!(!shape.matches("alice/glow-button-42"));
    }

    #[test]
    fn test_rooted_path() {
        assert_eq!(
            rooted_path("https://site.io/alice/btn-1"),
            Some("/alice/btn-1".to_string())
        );
        assert_eq!(rooted_path("/alice/btn-1"), Some("/alice/btn-1".to_string()));
        assert_eq!(
            rooted_path("https://site.io/buttons?page=2"),
            Some("/buttons?page=2".to_string())
        );

        assert_eq!(rooted_path("alice/btn-1"), None);
        assert_eq!(rooted_path("#top"), None);
        assert_eq!(rooted_path("//cdn.site.io/x"), None);
        assert_eq!(rooted_path("mailto:a@b.c"), None);
    }

    #[test]
    fn test_origin_of() {
        assert_eq!(
            origin_of("https://site.io/buttons?page=1"),
            Some("https://site.io".to_string())
        );
        assert_eq!(
            origin_of("http://127.0.0.1:8080/x"),
            Some("http://127.0.0.1:8080".to_string())
        );
        assert_eq!(origin_of("not a url"), None);
    }

    #[test]
    fn test_author_from_url() {
        assert_eq!(
            author_from_url("https://site.io/alice/glow-button-42"),
            Some("alice".to_string())
        );
        assert_eq!(author_from_url("https://site.io/buttons"), None);
        assert_eq!(author_from_url("/bob/card-1"), Some("bob".to_string()));
    }
}
