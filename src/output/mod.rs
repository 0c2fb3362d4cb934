//! Output module for run reports and store inspection
//!
//! This module handles:
//! - The per-entry report and summary line printed after a run
//! - Store statistics for `--stats`
//! - Search result listings for `--search`

mod report;
pub mod stats;

pub use report::{format_outcome_line, format_summary_line, print_run_summary, print_search_hits};
pub use stats::{load_statistics, print_statistics, CollectorStatistics};
