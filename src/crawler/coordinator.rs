//! Listing crawl coordinator
//!
//! This module drives a listing-site run:
//! - Walking listing pages until the empty-page streak or page limit is hit
//! - Filtering discovered links against the dedup indexes before dispatch
//! - Fanning extraction out over a bounded worker pool, re-created per page
//! - Committing results one at a time, in completion order

use crate::config::Config;
use crate::crawler::task::{fetch_component, TaskPlan, TaskResult};
use crate::discovery::LinkDiscovery;
use crate::extract::Extractor;
use crate::normalize::NormalizedDocument;
use crate::output::{PageReport, RunSummary, StopReason};
use crate::page::PageSource;
use crate::state::{CrawlProgress, DedupIndex, PageTally, PageVerdict, SkipReason, TaskOutcome};
use crate::storage::{InsertOutcome, KeyScope, Sink};
use crate::url::{author_from_url, natural_key};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Crawls a component listing into a sink
pub struct ListingCrawler<'a, S: Sink + ?Sized> {
    config: Arc<Config>,
    source: Arc<dyn PageSource>,
    extractor: Arc<Extractor>,
    discovery: LinkDiscovery,
    plan: Arc<TaskPlan>,
    sink: &'a mut S,
    keys: DedupIndex,
    authors: Option<DedupIndex>,
}

impl<'a, S: Sink + ?Sized> ListingCrawler<'a, S> {
    /// Creates a crawler and hydrates its dedup indexes from the sink
    pub fn new(
        config: Arc<Config>,
        source: Arc<dyn PageSource>,
        sink: &'a mut S,
    ) -> crate::Result<Self> {
        let library = config.listing.library.as_str();

        let keys: DedupIndex = sink
            .existing_keys(KeyScope::NaturalKeys { library })?
            .into_iter()
            .collect();
        let authors = if config.listing.resume_by_author {
            let authors: DedupIndex = sink
                .existing_keys(KeyScope::Authors { library })?
                .into_iter()
                .collect();
            Some(authors)
        } else {
            None
        };

        tracing::info!(
            "Loaded {} known keys{} for library {}",
            keys.len(),
            authors
                .as_ref()
                .map(|a| format!(" and {} known authors", a.len()))
                .unwrap_or_default(),
            library
        );

        let plan = Arc::new(TaskPlan {
            mode: config.browser.detail_render_mode,
            navigation_retries: config.browser.navigation_retries,
            library: config.listing.library.clone(),
            category: config.listing.category.clone(),
        });

        Ok(Self {
            extractor: Arc::new(Extractor::new(&config.extract, &config.browser)),
            discovery: LinkDiscovery::new(&config.listing, config.browser.listing_render_mode),
            plan,
            config,
            source,
            sink,
            keys,
            authors,
        })
    }

    /// Runs the page loop to completion
    ///
    /// Task failures are tallied, never propagated; the run only ends on the
    /// empty-page streak or the configured page limit.
    pub async fn run(&mut self) -> RunSummary {
        let threshold = self.config.pipeline.empty_page_threshold;
        let mut progress = CrawlProgress::new(self.config.listing.start_page);
        let mut pages = Vec::new();

        let stop = loop {
            if let Some(max) = self.config.listing.max_pages {
                if progress.pages_attempted() >= max {
                    break StopReason::MaxPages;
                }
            }

            let page_index = progress.page_index();
            let listing_url = self.config.listing.page_url(page_index);
            tracing::info!(
                "[{}] listing page {}: {}",
                self.config.listing.category,
                page_index,
                listing_url
            );

            let links = self.discovery.discover(self.source.clone(), &listing_url).await;
            tracing::info!("  links: {}", links.len());

            if links.is_empty() {
                if progress.record_empty(threshold) == PageVerdict::Stop {
                    tracing::info!(
                        "Stopping after {} consecutive empty pages",
                        progress.empty_streak()
                    );
                    break StopReason::EmptyStreak;
                }
                continue;
            }

            let link_count = links.len();
            let tally = self.process_page(links).await;
            tracing::info!(
                "Page {} done: ok={} skip={} err={}",
                page_index,
                tally.ok,
                tally.skip,
                tally.err
            );

            progress.record_page(&tally);
            pages.push(PageReport {
                page_index,
                links: link_count,
                tally,
            });
        };

        RunSummary {
            category: self.config.listing.category.clone(),
            pages,
            pages_attempted: progress.pages_attempted(),
            committed: progress.committed_total(),
            stop,
        }
    }

    /// Extracts every link of one page in parallel and commits the results
    async fn process_page(&mut self, links: BTreeSet<String>) -> PageTally {
        let mut tally = PageTally::default();
        let semaphore = Arc::new(Semaphore::new(self.config.pipeline.workers as usize));
        let mut tasks = JoinSet::new();

        for link in links {
            if let Some(reason) = self.dispatch_filter(&link) {
                tracing::debug!("Not dispatching {}: {}", link, reason);
                tally.record(&TaskOutcome::Skipped(reason));
                continue;
            }

            let semaphore = semaphore.clone();
            let source = self.source.clone();
            let extractor = self.extractor.clone();
            let plan = self.plan.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                fetch_component(source, extractor, plan, link).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(TaskResult::Extracted(document)) => self.commit(document),
                Ok(TaskResult::Empty { url }) => {
                    tracing::warn!("  skip (no code): {}", url);
                    TaskOutcome::Skipped(SkipReason::NoCode)
                }
                Ok(TaskResult::Failed { url, error }) => {
                    tracing::error!("  detail error on {}: {}", url, error);
                    TaskOutcome::Failed(error)
                }
                Err(e) => {
                    tracing::error!("  detail task aborted: {}", e);
                    TaskOutcome::Failed(e.to_string())
                }
            };
            tally.record(&outcome);
        }

        tally
    }

    /// Reason a link should not be dispatched, if any
    fn dispatch_filter(&self, link: &str) -> Option<SkipReason> {
        if self.keys.is_processed(&natural_key(link)) {
            return Some(SkipReason::Duplicate);
        }

        let authors = self.authors.as_ref()?;
        author_from_url(link)
            .filter(|author| authors.is_processed(author))
            .map(|_| SkipReason::KnownAuthor)
    }

    /// Commits one document in its own transaction and updates the indexes
    fn commit(&mut self, document: NormalizedDocument) -> TaskOutcome {
        if self.keys.is_processed(&document.natural_key) {
            return TaskOutcome::Skipped(SkipReason::Duplicate);
        }

        match self.sink.insert(&document) {
            Ok(InsertOutcome::Inserted(_)) => {
                tracing::info!("  saved: {} ({})", document.display_name, document.source_url);
                if let (Some(authors), Some(author)) = (self.authors.as_mut(), &document.author) {
                    authors.mark_processed(author.clone());
                }
                self.keys.mark_processed(document.natural_key);
                TaskOutcome::Committed
            }
            Ok(InsertOutcome::Conflict) => {
                tracing::error!("  conflict, rolled back: {}", document.natural_key);
                TaskOutcome::Failed(format!("conflict on {}", document.natural_key))
            }
            Err(e) => {
                tracing::error!("  commit failed for {}: {}", document.natural_key, e);
                TaskOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::page::InMemoryPageSource;
    use crate::storage::{SqliteStorage, Storage};

    const CONFIG: &str = r#"
[listing]
listing-url = "https://site.io/buttons?page={page}"
category = "Buttons"
library = "universe"
scroll-steps = 0
scroll-delay-ms = 0
resume-by-author = true

[browser]
tab-poll-delay-ms = 0

[pipeline]
workers = 2

[output]
database-path = "./unused.db"
"#;

    fn config() -> Arc<Config> {
        Arc::new(parse_config(CONFIG).unwrap())
    }

    fn listing(links: &[&str]) -> String {
        links
            .iter()
            .map(|l| format!("<a href=\"{}\">Get code</a>", l))
            .collect()
    }

    fn detail(style: &str) -> String {
        format!("<pre><code>{}</code></pre>", style)
    }

    #[tokio::test]
    async fn test_known_author_links_are_not_dispatched() {
        let source = Arc::new(
            InMemoryPageSource::new()
                .with_page(
                    "https://site.io/buttons?page=1",
                    listing(&["/alice/old-1", "/bob/new-2"]),
                )
                .with_page("https://site.io/alice/old-1", detail(".a { x: 1; }"))
                .with_page("https://site.io/bob/new-2", detail(".b { x: 1; }")),
        );

        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .insert(&NormalizedDocument {
                natural_key: "earlier-9".to_string(),
                display_name: "Earlier".to_string(),
                combined_markup: "<!DOCTYPE html>".to_string(),
                library: "universe".to_string(),
                source_url: "https://site.io/alice/earlier-9".to_string(),
                author: Some("alice".to_string()),
                category: "Buttons".to_string(),
                license: None,
            })
            .unwrap();

        let summary = ListingCrawler::new(config(), source.clone(), &mut storage)
            .unwrap()
            .run()
            .await;

        assert!(!source.opened().contains(&"https://site.io/alice/old-1".to_string()));
        assert!(source.opened().contains(&"https://site.io/bob/new-2".to_string()));
        assert_eq!(summary.pages[0].tally, PageTally { ok: 1, skip: 1, err: 0 });
        assert_eq!(storage.count_components().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_tallied_per_page() {
        let source = Arc::new(
            InMemoryPageSource::new()
                .with_page(
                    "https://site.io/buttons?page=1",
                    listing(&["/a/ok-1", "/a/empty-2", "/a/missing-3", "/a/slow-4"]),
                )
                .with_page("https://site.io/a/ok-1", detail(".ok { x: 1; }"))
                .with_page("https://site.io/a/empty-2", "<p>no code</p>")
                .with_timeout("https://site.io/a/slow-4"),
        );

        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let summary = ListingCrawler::new(config(), source.clone(), &mut storage)
            .unwrap()
            .run()
            .await;

        assert_eq!(summary.pages.len(), 1);
        assert_eq!(summary.pages[0].tally, PageTally { ok: 1, skip: 1, err: 2 });
        assert_eq!(summary.committed, 1);
        assert_eq!(summary.stop, StopReason::EmptyStreak);
        assert_eq!(source.open_pages(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_slugs_commit_once() {
        let source = Arc::new(
            InMemoryPageSource::new()
                .with_page(
                    "https://site.io/buttons?page=1",
                    listing(&["/alice/glow-1", "/bob/glow-1"]),
                )
                .with_page("https://site.io/alice/glow-1", detail(".g { x: 1; }"))
                .with_page("https://site.io/bob/glow-1", detail(".g { x: 2; }")),
        );

        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let summary = ListingCrawler::new(config(), source, &mut storage)
            .unwrap()
            .run()
            .await;

        assert_eq!(summary.committed, 1);
        assert_eq!(summary.pages[0].tally.skip, 1);
        assert_eq!(storage.count_components().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_max_pages_limits_the_run() {
        let source = Arc::new(
            InMemoryPageSource::new()
                .with_page("https://site.io/buttons?page=1", listing(&["/a/x-1"]))
                .with_page("https://site.io/buttons?page=2", listing(&["/a/y-2"]))
                .with_page("https://site.io/a/x-1", detail(".x { a: b; }"))
                .with_page("https://site.io/a/y-2", detail(".y { a: b; }")),
        );

        let mut config = parse_config(CONFIG).unwrap();
        config.listing.max_pages = Some(1);

        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let summary = ListingCrawler::new(Arc::new(config), source.clone(), &mut storage)
            .unwrap()
            .run()
            .await;

        assert_eq!(summary.stop, StopReason::MaxPages);
        assert_eq!(summary.pages_attempted, 1);
        assert!(!source.opened().contains(&"https://site.io/buttons?page=2".to_string()));
    }
}
