use crate::page::RenderMode;
use serde::Deserialize;

/// Main configuration structure for Swatchbook
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub listing: ListingConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
    pub output: OutputConfig,
}

/// Listing site crawl configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ListingConfig {
    /// Listing page URL template; `{page}` is replaced with the page index
    #[serde(default)]
    pub listing_url: String,

    /// Category label stored with every record from this listing
    #[serde(default)]
    pub category: String,

    /// Several listings crawled in order; replaces `listing-url` and `category`
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,

    /// Library label stored with every record from this listing
    pub library: String,

    #[serde(default = "default_start_page")]
    pub start_page: u32,

    /// Stop after this many listing pages even if pages keep yielding links
    #[serde(default)]
    pub max_pages: Option<u32>,

    #[serde(default = "default_scroll_steps")]
    pub scroll_steps: u32,

    #[serde(default = "default_scroll_step_px")]
    pub scroll_step_px: u32,

    #[serde(default = "default_scroll_delay_ms")]
    pub scroll_delay_ms: u64,

    /// Call-to-action text carried by detail links ("Get code")
    #[serde(default = "default_cta_phrase")]
    pub cta_phrase: String,

    /// Attribute marking discoverable anchors (`attr="true"`)
    #[serde(default = "default_discover_attribute")]
    pub discover_attribute: String,

    /// Regular expression a rooted detail path must match
    #[serde(default = "default_detail_pattern")]
    pub detail_pattern: String,

    /// Skip every link of an author that already has a committed record
    #[serde(default)]
    pub resume_by_author: bool,
}

/// One category listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CategoryConfig {
    pub name: String,
    pub listing_url: String,
}

/// Page rendering configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BrowserConfig {
    #[serde(default = "default_listing_mode")]
    pub listing_render_mode: RenderMode,

    #[serde(default)]
    pub detail_render_mode: RenderMode,

    /// Bounded wait for a page to become ready (seconds)
    #[serde(default = "default_ready_timeout")]
    pub ready_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_tab_poll_retries")]
    pub tab_poll_retries: u32,

    #[serde(default = "default_tab_poll_delay_ms")]
    pub tab_poll_delay_ms: u64,

    /// Extra attempts for a detail page that timed out
    #[serde(default = "default_navigation_retries")]
    pub navigation_retries: u32,
}

/// Selectors driving the code panel extraction
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExtractConfig {
    #[serde(default = "default_markup_tab")]
    pub markup_tab: String,

    #[serde(default = "default_style_tab")]
    pub style_tab: String,

    #[serde(default = "default_markup_element_id")]
    pub markup_element_id: String,

    #[serde(default = "default_style_element_id")]
    pub style_element_id: String,

    /// Class signature of the code editor textarea
    #[serde(default = "default_editor_class")]
    pub editor_class: String,
}

/// Worker pool and termination configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PipelineConfig {
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Consecutive empty listing pages that end the run
    #[serde(default = "default_empty_page_threshold")]
    pub empty_page_threshold: u32,
}

/// Code-host API crawl configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RemoteConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_raw_base")]
    pub raw_base: String,

    /// Name of the environment variable holding the API token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_connect_backoff")]
    pub connect_backoff_secs: u64,

    #[serde(default = "default_server_backoff")]
    pub server_backoff_secs: u64,

    #[serde(default = "default_rate_limit_margin")]
    pub rate_limit_margin_secs: u64,

    #[serde(default = "default_branch_candidates")]
    pub branch_candidates: Vec<String>,

    #[serde(default = "default_file_extensions")]
    pub file_extensions: Vec<String>,

    /// A file is kept when it contains at least one of these (case-insensitive)
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    /// A file is dropped when it contains any of these (case-insensitive)
    #[serde(default)]
    pub forbidden_terms: Vec<String>,

    #[serde(default)]
    pub min_length: usize,

    /// Files whose repository path starts with one of these are never fetched
    /// (case-insensitive)
    #[serde(default = "default_skip_path_prefixes")]
    pub skip_path_prefixes: Vec<String>,

    #[serde(default = "default_allowed_licenses")]
    pub allowed_licenses: Vec<String>,

    /// Explicit repositories as `owner/name`
    #[serde(default)]
    pub repos: Vec<String>,

    #[serde(default)]
    pub search_queries: Vec<String>,

    #[serde(default = "default_search_pages")]
    pub search_pages: u32,

    #[serde(default = "default_remote_library")]
    pub library: String,

    #[serde(default = "default_remote_category")]
    pub category: String,

    /// Pause between repositories (milliseconds)
    #[serde(default = "default_request_pause_ms")]
    pub request_pause_ms: u64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the SQLite database file
    pub database_path: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            listing_render_mode: default_listing_mode(),
            detail_render_mode: RenderMode::default(),
            ready_timeout_secs: default_ready_timeout(),
            user_agent: default_user_agent(),
            tab_poll_retries: default_tab_poll_retries(),
            tab_poll_delay_ms: default_tab_poll_delay_ms(),
            navigation_retries: default_navigation_retries(),
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            markup_tab: default_markup_tab(),
            style_tab: default_style_tab(),
            markup_element_id: default_markup_element_id(),
            style_element_id: default_style_element_id(),
            editor_class: default_editor_class(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            empty_page_threshold: default_empty_page_threshold(),
        }
    }
}

impl ListingConfig {
    /// Builds the listing URL for one page index
    pub fn page_url(&self, page: u32) -> String {
        self.listing_url.replace("{page}", &page.to_string())
    }

    /// Listings to crawl, in order
    ///
    /// The `categories` list when present, otherwise the single top-level listing.
    pub fn targets(&self) -> Vec<CategoryConfig> {
        if self.categories.is_empty() {
            vec![CategoryConfig {
                name: self.category.clone(),
                listing_url: self.listing_url.clone(),
            }]
        } else {
            self.categories.clone()
        }
    }

    /// This listing narrowed to one category
    pub fn for_category(&self, target: &CategoryConfig) -> ListingConfig {
        ListingConfig {
            listing_url: target.listing_url.clone(),
            category: target.name.clone(),
            categories: Vec::new(),
            ..self.clone()
        }
    }
}

fn default_start_page() -> u32 {
    1
}

fn default_scroll_steps() -> u32 {
    18
}

fn default_scroll_step_px() -> u32 {
    1800
}

fn default_scroll_delay_ms() -> u64 {
    350
}

fn default_cta_phrase() -> String {
    "get code".to_string()
}

fn default_detail_pattern() -> String {
    crate::url::DEFAULT_DETAIL_PATTERN.to_string()
}

fn default_discover_attribute() -> String {
    "data-discover".to_string()
}

fn default_listing_mode() -> RenderMode {
    RenderMode::Windowed
}

fn default_ready_timeout() -> u64 {
    15
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36"
        .to_string()
}

fn default_tab_poll_retries() -> u32 {
    3
}

fn default_tab_poll_delay_ms() -> u64 {
    150
}

fn default_navigation_retries() -> u32 {
    1
}

fn default_markup_tab() -> String {
    "html".to_string()
}

fn default_style_tab() -> String {
    "css".to_string()
}

fn default_markup_element_id() -> String {
    "codeArea2".to_string()
}

fn default_style_element_id() -> String {
    "codeArea1".to_string()
}

fn default_editor_class() -> String {
    "npm__react-simple-code-editor__textarea".to_string()
}

fn default_workers() -> u32 {
    6
}

fn default_empty_page_threshold() -> u32 {
    2
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_raw_base() -> String {
    "https://raw.githubusercontent.com".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_remote_timeout() -> u64 {
    20
}

fn default_max_retries() -> u32 {
    5
}

fn default_connect_backoff() -> u64 {
    3
}

fn default_server_backoff() -> u64 {
    2
}

fn default_rate_limit_margin() -> u64 {
    3
}

fn default_branch_candidates() -> Vec<String> {
    ["main", "master", "gh-pages", "source"]
        .iter()
        .map(|b| b.to_string())
        .collect()
}

fn default_file_extensions() -> Vec<String> {
    [".css", ".scss", ".sass"]
        .iter()
        .map(|e| e.to_string())
        .collect()
}

fn default_keywords() -> Vec<String> {
    [
        "@keyframes",
        "clip-path",
        "gradient",
        "filter",
        "shadow",
        "transform",
        "translate",
        "rotate",
        "scale",
        "mask",
        "skew",
        "animation",
        "perspective",
    ]
    .iter()
    .map(|k| k.to_string())
    .collect()
}

fn default_allowed_licenses() -> Vec<String> {
    [
        "MIT",
        "CC0-1.0",
        "CC-BY-4.0",
        "BSD-3-Clause",
        "BSD-2-Clause",
        "Apache-2.0",
        "Unknown",
        "NOASSERTION",
    ]
    .iter()
    .map(|l| l.to_string())
    .collect()
}

fn default_search_pages() -> u32 {
    10
}

fn default_remote_library() -> String {
    "css-art".to_string()
}

fn default_remote_category() -> String {
    "CSS Art".to_string()
}

fn default_skip_path_prefixes() -> Vec<String> {
    vec!["index".to_string(), "demo".to_string(), "example".to_string()]
}

fn default_request_pause_ms() -> u64 {
    400
}
