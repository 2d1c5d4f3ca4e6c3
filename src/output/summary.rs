//! Run summaries returned by the collectors

use crate::state::PageTally;
use std::fmt;

/// Why a listing run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Consecutive listing pages came back without links
    EmptyStreak,
    /// The configured page limit was reached
    MaxPages,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyStreak => write!(f, "empty-page streak"),
            Self::MaxPages => write!(f, "page limit"),
        }
    }
}

/// Outcome counts of one listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    pub page_index: u32,
    pub links: usize,
    pub tally: PageTally,
}

/// Summary of one category listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub category: String,
    /// Pages that yielded links, in crawl order
    pub pages: Vec<PageReport>,
    /// Every listing page opened, empty ones included
    pub pages_attempted: u32,
    pub committed: u64,
    pub stop: StopReason,
}

impl RunSummary {
    /// Totals over every page
    pub fn totals(&self) -> PageTally {
        self.pages.iter().fold(PageTally::default(), |acc, page| PageTally {
            ok: acc.ok + page.tally.ok,
            skip: acc.skip + page.tally.skip,
            err: acc.err + page.tally.err,
        })
    }

    /// Logs the category summary
    pub fn log(&self) {
        let totals = self.totals();
        tracing::info!(
            "[{}] finished ({}): {} pages, committed={}, skip={}, err={}",
            self.category,
            self.stop,
            self.pages_attempted,
            self.committed,
            totals.skip,
            totals.err
        );
    }
}

/// Summary of a listing run over every category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingSummary {
    /// One entry per category, in crawl order
    pub categories: Vec<RunSummary>,
}

impl ListingSummary {
    pub fn committed(&self) -> u64 {
        self.categories.iter().map(|c| c.committed).sum()
    }

    /// Totals over every category
    pub fn totals(&self) -> PageTally {
        self.categories.iter().map(RunSummary::totals).fold(
            PageTally::default(),
            |acc, tally| PageTally {
                ok: acc.ok + tally.ok,
                skip: acc.skip + tally.skip,
                err: acc.err + tally.err,
            },
        )
    }

    /// Category summary by name
    pub fn category(&self, name: &str) -> Option<&RunSummary> {
        self.categories.iter().find(|c| c.category == name)
    }

    /// Logs every category and the overall totals
    pub fn log(&self) {
        for category in &self.categories {
            category.log();
        }
        let totals = self.totals();
        tracing::info!(
            "Run finished: {} categories, committed={}, skip={}, err={}",
            self.categories.len(),
            self.committed(),
            totals.skip,
            totals.err
        );
    }
}

/// Summary of a code-host run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeHostSummary {
    pub repos_seen: u32,
    pub repos_skipped: u32,
    pub files_fetched: u32,
    pub tally: PageTally,
}

impl CodeHostSummary {
    pub fn committed(&self) -> u64 {
        self.tally.ok as u64
    }

    /// Logs the final run summary
    pub fn log(&self) {
        tracing::info!(
            "Run finished: {} repos ({} skipped), {} files fetched, committed={}, skip={}, err={}",
            self.repos_seen,
            self.repos_skipped,
            self.files_fetched,
            self.tally.ok,
            self.tally.skip,
            self.tally.err
        );
    }
}
