//! Output module for reporting on stored data
//!
//! This module handles:
//! - Loading database statistics for the `--stats` view
//! - Printing them to stdout

pub mod stats;

pub use stats::{load_statistics, print_statistics, TideStatistics};
