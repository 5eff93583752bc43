//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: the controller state machine (idle, running a page, stopped)
//! - `PageOutcome`: what a single listing page produced
//! - `CrawlSession`: run counters written to the session log at the end
//! - `PageTally`: per-page counters merged into the session on commit

mod crawl_state;
mod session;

// Re-export main types
pub use crawl_state::{CrawlState, PageOutcome, StopReason};
pub use session::{CrawlSession, PageTally, SessionStatus};
