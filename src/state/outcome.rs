/// Task outcome definitions for per-item tallies
use std::fmt;

/// Why a task produced no record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Every extraction strategy came back empty
    NoCode,

    /// The natural key already has a committed record
    Duplicate,

    /// The author already has a committed record and resume-by-author is on
    KnownAuthor,

    /// A content filter (keywords, forbidden terms, length, license) rejected it
    Filtered,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoCode => "no_code",
            Self::Duplicate => "duplicate",
            Self::KnownAuthor => "known_author",
            Self::Filtered => "filtered",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one extraction task, as tallied per page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// A record was committed
    Committed,

    /// Nothing to store; a legitimate outcome
    Skipped(SkipReason),

    /// Navigation, extraction or commit failed
    Failed(String),
}

impl TaskOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Committed)
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Committed => write!(f, "ok"),
            Self::Skipped(reason) => write!(f, "skip({})", reason),
            Self::Failed(error) => write!(f, "error({})", error),
        }
    }
}
