//! Code-host crawl coordinator
//!
//! Walks configured and searched repositories, fetches their style and markup files,
//! and commits each kept file through the same normalizer and sink as the listing
//! crawl. Owners that already have committed records are skipped, so an interrupted
//! run resumes where it stopped.

use super::codehost::{CodeHostApi, RepoRef};
use crate::config::RemoteConfig;
use crate::extract::RawExtraction;
use crate::normalize::NormalizedDocument;
use crate::output::CodeHostSummary;
use crate::state::{DedupIndex, SkipReason, TaskOutcome};
use crate::storage::{InsertOutcome, KeyScope, Sink};
use crate::url::natural_key_from_parts;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::time::Duration;

/// Extensions read as the markup side; every other fetched file is style
const MARKUP_EXTENSIONS: &[&str] = &[".html", ".htm"];

/// Which normalizer input a file feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Markup,
    Style,
}

impl FileRole {
    pub fn of_path(path: &str) -> Self {
        let lower = path.to_lowercase();
        if MARKUP_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            Self::Markup
        } else {
            Self::Style
        }
    }
}

/// Path and content filters applied to repository files
#[derive(Debug, Clone)]
pub struct FileFilter {
    keywords: Vec<String>,
    forbidden: Vec<String>,
    min_length: usize,
    skipped_prefixes: Vec<String>,
}

impl FileFilter {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            keywords: config.keywords.iter().map(|k| k.to_lowercase()).collect(),
            forbidden: config.forbidden_terms.iter().map(|t| t.to_lowercase()).collect(),
            min_length: config.min_length,
            skipped_prefixes: config
                .skip_path_prefixes
                .iter()
                .map(|p| p.to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Returns true unless the path starts with a skipped prefix (`index.css`,
    /// `demo/`, `Examples/`)
    pub fn accepts_path(&self, path: &str) -> bool {
        let lower = path.to_lowercase();
        !self
            .skipped_prefixes
            .iter()
            .any(|prefix| lower.starts_with(prefix.as_str()))
    }

    /// Returns true if the file should be kept
    ///
    /// One keyword is enough; an empty keyword list keeps everything.
    pub fn accepts(&self, code: &str) -> bool {
        if code.trim().is_empty() || code.len() < self.min_length {
            return false;
        }
        let lower = code.to_lowercase();
        if self.forbidden.iter().any(|t| lower.contains(t.as_str())) {
            return false;
        }
        self.keywords.is_empty() || self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}

fn file_key(repo: &RepoRef, path: &str) -> String {
    natural_key_from_parts(&[&repo.owner, &repo.name, path])
}

fn content_hash(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.trim().as_bytes());
    hex::encode(hasher.finalize())
}

/// Crawls code-host repositories into a sink
pub struct CodeHostCrawler<'a, S: Sink + ?Sized> {
    api: CodeHostApi,
    config: RemoteConfig,
    filter: FileFilter,
    sink: &'a mut S,
    keys: DedupIndex,
    owners: DedupIndex,
    seen_content: HashSet<String>,
    pause: Duration,
}

impl<'a, S: Sink + ?Sized> CodeHostCrawler<'a, S> {
    /// Creates a crawler and loads the keys and owners already present in the sink
    pub fn new(api: CodeHostApi, config: &RemoteConfig, sink: &'a mut S) -> crate::Result<Self> {
        let library = config.library.as_str();
        let keys: DedupIndex = sink
            .existing_keys(KeyScope::NaturalKeys { library })?
            .into_iter()
            .collect();
        let owners: DedupIndex = sink
            .existing_keys(KeyScope::Authors { library })?
            .into_iter()
            .collect();
        tracing::info!(
            "Resuming: {} files and {} owners already processed",
            keys.len(),
            owners.len()
        );

        Ok(Self {
            api,
            filter: FileFilter::new(config),
            pause: Duration::from_millis(config.request_pause_ms),
            config: config.clone(),
            sink,
            keys,
            owners,
            seen_content: HashSet::new(),
        })
    }

    /// Explicit repositories first, then search results, unique by `owner/name`
    async fn repositories(&self) -> Vec<RepoRef> {
        let mut seen = HashSet::new();
        let mut repos = Vec::new();

        for full_name in &self.config.repos {
            let Some((owner, name)) = full_name.split_once('/') else {
                tracing::warn!("Ignoring repository without owner: {}", full_name);
                continue;
            };
            match self.api.repo_info(owner, name).await {
                Some(info) => {
                    let repo = info.to_ref();
                    if seen.insert(repo.full_name()) {
                        repos.push(repo);
                    }
                }
                None => tracing::warn!("Repository {} not found", full_name),
            }
        }

        if !self.config.search_queries.is_empty() {
            let found = self
                .api
                .search_repositories(&self.config.search_queries, self.config.search_pages, self.pause)
                .await;
            repos.extend(found.into_iter().filter(|r| seen.insert(r.full_name())));
        }

        tracing::info!("Unique repositories: {}", repos.len());
        repos
    }

    /// Runs the crawl to completion
    pub async fn run(&mut self) -> CodeHostSummary {
        let mut summary = CodeHostSummary::default();

        for repo in self.repositories().await {
            summary.repos_seen += 1;

            if self.owners.is_processed(&repo.owner) {
                tracing::debug!("Owner {} already processed, skipping {}", repo.owner, repo.full_name());
                summary.repos_skipped += 1;
                continue;
            }

            if !self.config.allowed_licenses.iter().any(|l| l == &repo.license) {
                tracing::info!("License excluded: {} ({})", repo.full_name(), repo.license);
                summary.repos_skipped += 1;
                continue;
            }

            let kept = self.process_repo(&repo, &mut summary).await;
            if kept > 0 {
                self.owners.mark_processed(repo.owner.clone());
            }
            tokio::time::sleep(self.pause).await;
        }

        summary
    }

    /// Processes one repository and returns how many files were committed
    async fn process_repo(&mut self, repo: &RepoRef, summary: &mut CodeHostSummary) -> u32 {
        let Some(branch) = self
            .api
            .resolve_branch(&repo.owner, &repo.name, &self.config.branch_candidates)
            .await
        else {
            tracing::warn!("No branch resolved for {}", repo.full_name());
            summary.repos_skipped += 1;
            return 0;
        };

        let paths = self
            .api
            .list_paths(&repo.owner, &repo.name, &branch, &self.config.file_extensions)
            .await;
        if paths.is_empty() {
            tracing::info!("No matching files in {}@{}", repo.full_name(), branch);
            return 0;
        }

        let mut kept = 0;
        for path in &paths {
            if !self.filter.accepts_path(path) {
                tracing::debug!("Skipping boilerplate path {}:{}", repo.full_name(), path);
                summary.tally.record(&TaskOutcome::Skipped(SkipReason::Filtered));
                continue;
            }
            if self.keys.is_processed(&file_key(repo, path)) {
                tracing::debug!("Already stored: {}:{}", repo.full_name(), path);
                summary.tally.record(&TaskOutcome::Skipped(SkipReason::Duplicate));
                continue;
            }

            let Some(code) = self.api.fetch_raw(&repo.owner, &repo.name, &branch, path).await else {
                continue;
            };
            summary.files_fetched += 1;

            let outcome = self.commit_file(repo, path, &code);
            if outcome.is_ok() {
                kept += 1;
            }
            summary.tally.record(&outcome);
        }

        tracing::info!(
            "{}@{}: kept {} of {} files (total committed: {})",
            repo.full_name(),
            branch,
            kept,
            paths.len(),
            summary.tally.ok
        );
        kept
    }

    fn commit_file(&mut self, repo: &RepoRef, path: &str, code: &str) -> TaskOutcome {
        if !self.filter.accepts(code) {
            return TaskOutcome::Skipped(SkipReason::Filtered);
        }
        if !self.seen_content.insert(content_hash(code)) {
            return TaskOutcome::Skipped(SkipReason::Duplicate);
        }

        let (markup_raw, style_raw) = match FileRole::of_path(path) {
            FileRole::Markup => (code.to_string(), String::new()),
            FileRole::Style => (String::new(), code.to_string()),
        };
        let raw = RawExtraction {
            natural_key: file_key(repo, path),
            markup_raw,
            style_raw,
            author: repo.owner.clone(),
            source_url: repo.url.clone(),
        };
        let document = NormalizedDocument::from_extraction(&raw, &self.config.library, &self.config.category)
            .with_display_name(path)
            .with_license(Some(repo.license.clone()));

        match self.sink.insert(&document) {
            Ok(InsertOutcome::Inserted(_)) => {
                self.keys.mark_processed(document.natural_key);
                TaskOutcome::Committed
            }
            Ok(InsertOutcome::Conflict) => {
                tracing::error!("Conflict, rolled back: {}:{}", repo.full_name(), path);
                TaskOutcome::Failed(format!("conflict on {}", document.natural_key))
            }
            Err(e) => {
                tracing::error!("Insert failed for {}:{}: {}", repo.full_name(), path, e);
                TaskOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{BackoffPolicy, RateLimitedClient};
    use crate::storage::{SqliteStorage, Storage};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn remote_config(repos: &[&str]) -> RemoteConfig {
        let toml = format!(
            r#"
repos = [{}]
keywords = ["gradient"]
forbidden-terms = ["@apply"]
request-pause-ms = 0
"#,
            repos
                .iter()
                .map(|r| format!("\"{}\"", r))
                .collect::<Vec<_>>()
                .join(", ")
        );
        toml::from_str(&toml).unwrap()
    }

    fn api(server: &MockServer) -> CodeHostApi {
        let policy = BackoffPolicy {
            connect_step: Duration::ZERO,
            server_step: Duration::ZERO,
            max_retries: 0,
            rate_limit_margin: Duration::ZERO,
        };
        let client = RateLimitedClient::with_client(reqwest::Client::new(), policy);
        CodeHostApi::new(client, &server.uri(), &format!("{}/raw", server.uri()))
    }

    async fn mount_repo(server: &MockServer, owner: &str, name: &str, license: &str, files: &[(&str, &str)]) {
        Mock::given(method("GET"))
            .and(path(format!("/repos/{}/{}", owner, name)))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": name,
                "owner": { "login": owner },
                "html_url": format!("https://code.host/{}/{}", owner, name),
                "default_branch": "main",
                "license": { "spdx_id": license },
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/repos/{}/{}/branches/main", owner, name)))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
        let tree: Vec<_> = files
            .iter()
            .map(|(p, _)| serde_json::json!({ "path": p }))
            .collect();
        Mock::given(method("GET"))
            .and(path(format!("/repos/{}/{}/git/trees/main", owner, name)))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "tree": tree })))
            .mount(server)
            .await;
        for (file, body) in files {
            Mock::given(method("GET"))
                .and(path(format!("/raw/{}/{}/main/{}", owner, name, file)))
                .respond_with(ResponseTemplate::new(200).set_body_string(*body))
                .mount(server)
                .await;
        }
    }

    #[test]
    fn test_file_filter() {
        let mut config = remote_config(&[]);
        config.min_length = 10;
        let filter = FileFilter::new(&config);

        assert!(filter.accepts(".a { background: linear-GRADIENT(red, blue); }"));
        assert!(!filter.accepts(".a { color: red; }"));
        assert!(!filter.accepts(".a { @apply gradient; }"));
        assert!(!filter.accepts("gradient"));
    }

    #[test]
    fn test_boilerplate_paths_are_skipped() {
        let filter = FileFilter::new(&remote_config(&[]));

        assert!(!filter.accepts_path("index.css"));
        assert!(!filter.accepts_path("Demo/glow.css"));
        assert!(!filter.accepts_path("EXAMPLES/sky.scss"));
        assert!(filter.accepts_path("src/index.css"));
        assert!(filter.accepts_path("art/sky.css"));

        let mut config = remote_config(&[]);
        config.skip_path_prefixes = vec!["vendor/".to_string()];
        let filter = FileFilter::new(&config);
        assert!(filter.accepts_path("index.css"));
        assert!(!filter.accepts_path("Vendor/reset.css"));
    }

    #[test]
    fn test_file_role() {
        assert_eq!(FileRole::of_path("demo/Index.HTML"), FileRole::Markup);
        assert_eq!(FileRole::of_path("src/glow.scss"), FileRole::Style);
    }

    #[tokio::test]
    async fn test_commits_files_and_skips_duplicates() {
        let server = MockServer::start().await;
        let art = ".sky { background: linear-gradient(#000, #00f); }";
        mount_repo(
            &server,
            "alice",
            "art",
            "MIT",
            &[("sky.css", art), ("copy/sky.css", art), ("plain.css", ".p { color: red; }")],
        )
        .await;

        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let config = remote_config(&["alice/art"]);
        let summary = CodeHostCrawler::new(api(&server), &config, &mut storage)
            .unwrap()
            .run()
            .await;

        assert_eq!(summary.files_fetched, 3);
        assert_eq!(summary.tally.ok, 1);
        assert_eq!(summary.tally.skip, 2);
        assert_eq!(storage.count_components().unwrap(), 1);

        let keys = storage
            .existing_keys(KeyScope::NaturalKeys { library: "css-art" })
            .unwrap();
        assert!(keys.contains("alice-art-sky-css"));
    }

    #[tokio::test]
    async fn test_stored_files_are_not_fetched_again() {
        let server = MockServer::start().await;
        let art = ".sky { background: linear-gradient(#000, #00f); }";
        mount_repo(&server, "alice", "art", "MIT", &[("moon.css", art)]).await;
        Mock::given(method("GET"))
            .and(path("/raw/alice/art/main/sky.css"))
            .respond_with(ResponseTemplate::new(200).set_body_string(art))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/raw/alice/art/main/demo/sky.css"))
            .respond_with(ResponseTemplate::new(200).set_body_string(art))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/alice/art/git/trees/main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tree": [{ "path": "sky.css" }, { "path": "demo/sky.css" }, { "path": "moon.css" }]
            })))
            .with_priority(1)
            .mount(&server)
            .await;

        // Stored earlier without an owner, so only the key marks it as done
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .insert(&NormalizedDocument {
                natural_key: "alice-art-sky-css".to_string(),
                display_name: "sky.css".to_string(),
                combined_markup: "<!DOCTYPE html>".to_string(),
                library: "css-art".to_string(),
                source_url: "https://code.host/alice/art".to_string(),
                author: None,
                category: "CSS Art".to_string(),
                license: Some("MIT".to_string()),
            })
            .unwrap();

        let config = remote_config(&["alice/art"]);
        let summary = CodeHostCrawler::new(api(&server), &config, &mut storage)
            .unwrap()
            .run()
            .await;

        assert_eq!(summary.files_fetched, 1);
        assert_eq!(summary.tally.ok, 1);
        assert_eq!(summary.tally.skip, 2);
        assert_eq!(summary.tally.err, 0);
        assert_eq!(storage.count_components().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_processed_owner_and_license_are_skipped() {
        let server = MockServer::start().await;
        let art = ".sky { background: radial-gradient(#000, #00f); }";
        mount_repo(&server, "alice", "one", "MIT", &[("a.css", art)]).await;
        mount_repo(&server, "alice", "two", "MIT", &[("b.css", ".b { filter: gradient(1); }")]).await;
        mount_repo(&server, "carol", "closed", "GPL-3.0", &[("c.css", art)]).await;

        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let config = remote_config(&["alice/one", "alice/two", "carol/closed"]);
        let summary = CodeHostCrawler::new(api(&server), &config, &mut storage)
            .unwrap()
            .run()
            .await;

        assert_eq!(summary.repos_seen, 3);
        assert_eq!(summary.repos_skipped, 2);
        assert_eq!(summary.committed(), 1);

        let authors = storage
            .existing_keys(KeyScope::Authors { library: "css-art" })
            .unwrap();
        assert_eq!(authors, HashSet::from(["alice".to_string()]));
    }
}
