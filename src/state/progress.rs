use super::TaskOutcome;

/// What the outer loop does after a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageVerdict {
    /// Move on to the next page
    Continue,
    /// The empty-streak threshold was reached
    Stop,
}

/// Outer-loop state for one listing run
///
/// Owned by the coordinator alone; workers never see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlProgress {
    page_index: u32,
    empty_streak: u32,
    pages_attempted: u32,
    committed_total: u64,
}

impl CrawlProgress {
    pub fn new(start_page: u32) -> Self {
        Self {
            page_index: start_page,
            empty_streak: 0,
            pages_attempted: 0,
            committed_total: 0,
        }
    }

    /// Listing page to attempt next
    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn empty_streak(&self) -> u32 {
        self.empty_streak
    }

    pub fn pages_attempted(&self) -> u32 {
        self.pages_attempted
    }

    pub fn committed_total(&self) -> u64 {
        self.committed_total
    }

    /// Records a page without links
    ///
    /// Stops once `threshold` consecutive pages came back empty; otherwise advances.
    pub fn record_empty(&mut self, threshold: u32) -> PageVerdict {
        self.pages_attempted += 1;
        self.empty_streak += 1;
        if self.empty_streak >= threshold {
            return PageVerdict::Stop;
        }
        self.page_index += 1;
        PageVerdict::Continue
    }

    /// Records a page with links once its tasks are settled
    pub fn record_page(&mut self, tally: &PageTally) -> PageVerdict {
        self.pages_attempted += 1;
        self.empty_streak = 0;
        self.committed_total += tally.ok as u64;
        self.page_index += 1;
        PageVerdict::Continue
    }
}

/// Per-page outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageTally {
    pub ok: u32,
    pub skip: u32,
    pub err: u32,
}

impl PageTally {
    pub fn record(&mut self, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Committed => self.ok += 1,
            TaskOutcome::Skipped(_) => self.skip += 1,
            TaskOutcome::Failed(_) => self.err += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.ok + self.skip + self.err
    }
}
