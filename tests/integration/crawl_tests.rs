//! Integration tests for the listing crawler
//!
//! These tests drive full listing runs into a SQLite file, over an in-memory page
//! source and over a wiremock server through the HTTP page engine.

use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;
use swatchbook::config::{parse_config, Config};
use swatchbook::crawler::{crawl_categories, ListingCrawler};
use swatchbook::output::StopReason;
use swatchbook::page::InMemoryPageSource;
use swatchbook::state::PageTally;
use swatchbook::storage::{SqliteStorage, Storage};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SITE: &str = "https://components.test";

/// Creates a test configuration for the given listing template and database
fn create_test_config(listing_url: &str, db_path: &Path) -> Config {
    parse_config(&format!(
        r#"
[listing]
listing-url = "{}"
category = "Buttons"
library = "universe"
scroll-steps = 0
scroll-delay-ms = 0

[browser]
tab-poll-delay-ms = 0
ready-timeout-secs = 5

[pipeline]
workers = 2
empty-page-threshold = 2

[output]
database-path = "{}"
"#,
        listing_url,
        db_path.display()
    ))
    .expect("valid test config")
}

fn listing(links: &[&str]) -> String {
    let cards: String = links
        .iter()
        .map(|l| format!(r#"<div class="card"><a href="{}">Get code</a></div>"#, l))
        .collect();
    format!("<html><body><nav><a href=\"/about\">About</a></nav>{}</body></html>", cards)
}

/// Detail page with tabbed code panels, as the listing site renders it
fn tabbed_detail(author: &str, markup: &str, style: &str) -> String {
    let editor = "npm__react-simple-code-editor__textarea";
    format!(
        r#"<html><body>
<div class="card__nickname text-color">@{author}</div>
<div role="tablist">
  <button role="tab" id="radix-trigger-html" aria-controls="radix-content-html" data-state="active">HTML</button>
  <button role="tab" id="radix-trigger-css" aria-controls="radix-content-css" data-state="inactive">CSS</button>
</div>
<div role="tabpanel" id="radix-content-html"><textarea id="codeArea2" class="{editor}">{markup}</textarea></div>
<div role="tabpanel" id="radix-content-css"><textarea id="codeArea1" class="{editor}">{style}</textarea></div>
</body></html>"#
    )
}

fn stored(db_path: &Path, key: &str) -> (String, String, Option<String>) {
    let conn = Connection::open(db_path).unwrap();
    conn.query_row(
        "SELECT name, code, author FROM components WHERE natural_key = ?1",
        params![key],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )
    .unwrap()
}

#[tokio::test]
async fn test_listing_run_commits_and_stops_on_empty_streak() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("components.db");
    let config = Arc::new(create_test_config(
        &format!("{}/buttons?page={{page}}", SITE),
        &db_path,
    ));

    let source = Arc::new(
        InMemoryPageSource::new()
            .with_page(
                format!("{}/buttons?page=1", SITE),
                listing(&["/alice/glow-button-1", "/bob/plain-card-2", "/carol/broken-3"]),
            )
            .with_page(
                format!("{}/buttons?page=2", SITE),
                listing(&["/dave/slow-4", "/alice/glow-button-1"]),
            )
            .with_page(
                format!("{}/alice/glow-button-1", SITE),
                tabbed_detail(
                    "alice",
                    "&lt;button class=\"glow\"&gt;Go&lt;/button&gt;",
                    ".glow { color: red; }",
                ),
            )
            .with_page(
                format!("{}/bob/plain-card-2", SITE),
                "<pre><code>.plain-card { padding: 4px; }</code></pre>",
            )
            .with_page(format!("{}/carol/broken-3", SITE), "<p>Nothing to see</p>")
            .with_timeout(format!("{}/dave/slow-4", SITE)),
    );

    let mut storage = SqliteStorage::new(&db_path).unwrap();
    let summary = ListingCrawler::new(config, source.clone(), &mut storage)
        .unwrap()
        .run()
        .await;

    assert_eq!(summary.stop, StopReason::EmptyStreak);
    assert_eq!(summary.pages_attempted, 4);
    assert_eq!(summary.committed, 2);
    assert_eq!(summary.pages.len(), 2);
    assert_eq!(summary.pages[0].tally, PageTally { ok: 2, skip: 1, err: 0 });
    assert_eq!(summary.pages[1].tally, PageTally { ok: 0, skip: 1, err: 1 });

    // The run stops after pages 3 and 4 come back empty
    let opened = source.opened();
    assert!(opened.contains(&format!("{}/buttons?page=4", SITE)));
    assert!(!opened.contains(&format!("{}/buttons?page=5", SITE)));
    assert_eq!(source.open_pages(), 0);

    assert_eq!(storage.count_components().unwrap(), 2);
    drop(storage);

    let (name, code, author) = stored(&db_path, "glow-button-1");
    assert_eq!(name, "Glow Button");
    assert_eq!(author.as_deref(), Some("alice"));
    assert!(code.starts_with("<!DOCTYPE html>"));
    assert!(code.contains(r#"<button class="glow">Go</button>"#));
    assert!(code.contains(".glow { color: red; }"));

    let (_, code, author) = stored(&db_path, "plain-card-2");
    assert_eq!(author.as_deref(), Some("bob"));
    assert!(code.contains(r#"<div class="plain-card">Preview</div>"#));
}

#[tokio::test]
async fn test_second_run_resumes_from_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("components.db");
    let config = Arc::new(create_test_config(
        &format!("{}/buttons?page={{page}}", SITE),
        &db_path,
    ));

    let build_source = || {
        Arc::new(
            InMemoryPageSource::new()
                .with_page(
                    format!("{}/buttons?page=1", SITE),
                    listing(&["/alice/glow-button-1", "/carol/broken-3"]),
                )
                .with_page(
                    format!("{}/alice/glow-button-1", SITE),
                    "<pre><code>.glow-button { color: red; }</code></pre>",
                )
                .with_page(format!("{}/carol/broken-3", SITE), "<p>Nothing</p>"),
        )
    };

    let mut storage = SqliteStorage::new(&db_path).unwrap();
    let first = ListingCrawler::new(config.clone(), build_source(), &mut storage)
        .unwrap()
        .run()
        .await;
    assert_eq!(first.committed, 1);
    drop(storage);

    let source = build_source();
    let mut storage = SqliteStorage::new(&db_path).unwrap();
    let second = ListingCrawler::new(config, source.clone(), &mut storage)
        .unwrap()
        .run()
        .await;

    assert_eq!(second.committed, 0);
    assert_eq!(second.pages[0].tally, PageTally { ok: 0, skip: 2, err: 0 });
    assert!(!source
        .opened()
        .contains(&format!("{}/alice/glow-button-1", SITE)));
    assert!(source.opened().contains(&format!("{}/carol/broken-3", SITE)));
    assert_eq!(storage.count_components().unwrap(), 1);
}

#[tokio::test]
async fn test_listing_run_over_http() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/buttons"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[
            "/alice/neon-button-7",
            "https://elsewhere.test/alice/foreign-8",
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/alice/neon-button-7"))
        .respond_with(ResponseTemplate::new(200).set_body_string(tabbed_detail(
            "alice",
            "&lt;button class=\"neon\"&gt;Neon&lt;/button&gt;",
            ".neon { box-shadow: 0 0 8px cyan; }",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("components.db");
    let config = Arc::new(create_test_config(
        &format!("{}/buttons?page={{page}}", base),
        &db_path,
    ));

    let mut storage = SqliteStorage::new(&db_path).unwrap();
    let summary = swatchbook::crawler::crawl(config, &mut storage).await.unwrap();

    assert_eq!(summary.committed(), 1);
    assert_eq!(summary.categories.len(), 1);
    let buttons = &summary.categories[0];
    assert_eq!(buttons.category, "Buttons");
    assert_eq!(buttons.pages[0].links, 1);
    assert_eq!(buttons.stop, StopReason::EmptyStreak);
    assert_eq!(storage.count_components().unwrap(), 1);
    drop(storage);

    let (name, code, _) = stored(&db_path, "neon-button-7");
    assert_eq!(name, "Neon Button");
    assert!(code.contains(r#"<button class="neon">Neon</button>"#));
}

#[tokio::test]
async fn test_each_category_is_crawled_with_its_own_label() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("components.db");
    let config = Arc::new(
        parse_config(&format!(
            r#"
[listing]
library = "tailwind"
scroll-steps = 0
scroll-delay-ms = 0

[[listing.categories]]
name = "Buttons"
listing-url = "{site}/buttons?page={{page}}"

[[listing.categories]]
name = "Cards"
listing-url = "{site}/cards?page={{page}}"

[browser]
tab-poll-delay-ms = 0

[pipeline]
empty-page-threshold = 1

[output]
database-path = "{db}"
"#,
            site = SITE,
            db = db_path.display()
        ))
        .unwrap(),
    );

    let source = Arc::new(
        InMemoryPageSource::new()
            .with_page(
                format!("{}/buttons?page=1", SITE),
                listing(&["/alice/glow-button-1", "/bob/shared-widget-5"]),
            )
            .with_page(
                format!("{}/cards?page=1", SITE),
                listing(&["/carol/flip-card-2", "/bob/shared-widget-5"]),
            )
            .with_page(
                format!("{}/alice/glow-button-1", SITE),
                "<pre><code>.glow-button { color: red; }</code></pre>",
            )
            .with_page(
                format!("{}/bob/shared-widget-5", SITE),
                "<pre><code>.shared-widget { margin: 0; }</code></pre>",
            )
            .with_page(
                format!("{}/carol/flip-card-2", SITE),
                "<pre><code>.flip-card { perspective: 600px; }</code></pre>",
            ),
    );

    let mut storage = SqliteStorage::new(&db_path).unwrap();
    let summary = crawl_categories(config, source.clone(), &mut storage)
        .await
        .unwrap();

    assert_eq!(summary.categories.len(), 2);
    assert_eq!(summary.committed(), 3);
    assert_eq!(summary.totals(), PageTally { ok: 3, skip: 1, err: 0 });

    let buttons = summary.category("Buttons").unwrap();
    assert_eq!(buttons.committed, 2);
    assert_eq!(buttons.stop, StopReason::EmptyStreak);

    // The record committed under Buttons is a duplicate for Cards
    let cards = summary.category("Cards").unwrap();
    assert_eq!(cards.committed, 1);
    assert_eq!(cards.pages[0].tally, PageTally { ok: 1, skip: 1, err: 0 });

    assert!(source.opened().contains(&format!("{}/cards?page=2", SITE)));
    assert_eq!(storage.count_components().unwrap(), 3);
    drop(storage);

    let conn = Connection::open(&db_path).unwrap();
    let category: String = conn
        .query_row(
            "SELECT category FROM components WHERE natural_key = ?1",
            params!["flip-card-2"],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(category, "Cards");
    let category: String = conn
        .query_row(
            "SELECT category FROM components WHERE natural_key = ?1",
            params!["shared-widget-5"],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(category, "Buttons");
}
