/// Crawl controller state machine
///
/// A run starts `Idle`, walks listing pages as `Running`, and ends in
/// `Stopped` with the reason it ended.
use std::fmt;

/// Why a crawl run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// A listing page yielded no job cards
    EndOfResults,

    /// The configured page budget was used up
    PageBudgetExhausted,

    /// Cancellation was requested
    Interrupted,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EndOfResults => "end_of_results",
            Self::PageBudgetExhausted => "page_budget_exhausted",
            Self::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of processing one listing page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page yielded this many job cards
    Fragments(usize),

    /// The page yielded no job cards
    Empty,

    /// The page could not be fetched
    Failed,

    /// Cancellation was observed while the page was in flight
    Interrupted,
}

impl PageOutcome {
    /// Classifies a parsed page by its card count
    pub fn from_count(count: usize) -> Self {
        if count == 0 {
            Self::Empty
        } else {
            Self::Fragments(count)
        }
    }
}

/// Current state of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    Idle,

    /// Working on listing page `page` (1-based)
    Running { page: u32 },

    Stopped(StopReason),
}

impl CrawlState {
    /// Leaves `Idle` for the first listing page
    ///
    /// A zero page budget stops immediately. Any other state is returned
    /// unchanged.
    pub fn start(self, max_pages: u32) -> Self {
        match self {
            Self::Idle if max_pages == 0 => Self::Stopped(StopReason::PageBudgetExhausted),
            Self::Idle => Self::Running { page: 1 },
            other => other,
        }
    }

    /// Applies the outcome of the current page
    ///
    /// A failed page advances like a productive one; the controller counts
    /// the error separately.
    pub fn advance(self, outcome: PageOutcome, max_pages: u32) -> Self {
        let Self::Running { page } = self else {
            return self;
        };

        match outcome {
            PageOutcome::Interrupted => Self::Stopped(StopReason::Interrupted),
            PageOutcome::Empty | PageOutcome::Fragments(0) => {
                Self::Stopped(StopReason::EndOfResults)
            }
            PageOutcome::Fragments(_) | PageOutcome::Failed => {
                if page >= max_pages {
                    Self::Stopped(StopReason::PageBudgetExhausted)
                } else {
                    Self::Running { page: page + 1 }
                }
            }
        }
    }

    /// Stops a run that has not already stopped
    pub fn interrupt(self) -> Self {
        match self {
            Self::Stopped(_) => self,
            _ => Self::Stopped(StopReason::Interrupted),
        }
    }

    pub fn current_page(&self) -> Option<u32> {
        match self {
            Self::Running { page } => Some(*page),
            _ => None,
        }
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        match self {
            Self::Stopped(reason) => Some(*reason),
            _ => None,
        }
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped(_))
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running { page } => write!(f, "running(page={})", page),
            Self::Stopped(reason) => write!(f, "stopped({})", reason),
        }
    }
}
