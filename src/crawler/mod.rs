//! Crawler module for listing-site harvesting
//!
//! This module contains the listing crawl logic, including:
//! - One paged crawl per configured category
//! - The outer page loop with empty-page termination
//! - Bounded parallel extraction per page
//! - Serialized, per-record commits to the sink

mod coordinator;
mod task;

pub use coordinator::ListingCrawler;
pub use task::{fetch_component, TaskPlan, TaskResult};

use crate::config::Config;
use crate::output::ListingSummary;
use crate::page::{HttpPageSource, PageSource};
use crate::storage::Sink;
use std::sync::Arc;

/// Runs a complete listing crawl over HTTP pages
///
/// This is the main entry point for a listing run. It will:
/// 1. Build the HTTP page source from the browser settings
/// 2. Crawl every configured category in order
///
/// # Returns
///
/// * `Ok(ListingSummary)` - Run finished (task failures are inside the summary)
/// * `Err(SwatchError)` - The sink could not be read or the client not built
pub async fn crawl<S: Sink + ?Sized>(
    config: Arc<Config>,
    sink: &mut S,
) -> crate::Result<ListingSummary> {
    let source = Arc::new(HttpPageSource::new(&config.browser)?);
    crawl_categories(config, source, sink).await
}

/// Runs the paged crawl once per category over `source`
///
/// Each category gets its own crawler, so its dedup indexes are hydrated from the
/// sink after the previous category committed. A record committed under one
/// category is a duplicate for the next.
pub async fn crawl_categories<S: Sink + ?Sized>(
    config: Arc<Config>,
    source: Arc<dyn PageSource>,
    sink: &mut S,
) -> crate::Result<ListingSummary> {
    let targets = config.listing.targets();
    let mut summary = ListingSummary::default();

    for (index, target) in targets.iter().enumerate() {
        tracing::info!(
            "Category {}/{}: {}",
            index + 1,
            targets.len(),
            target.name
        );

        let category_config = Arc::new(Config {
            listing: config.listing.for_category(target),
            ..(*config).clone()
        });
        let run = ListingCrawler::new(category_config, source.clone(), &mut *sink)?
            .run()
            .await;

        tracing::info!(
            "[{}] committed {} ({} in this run so far)",
            target.name,
            run.committed,
            summary.committed() + run.committed
        );
        summary.categories.push(run);
    }

    Ok(summary)
}
