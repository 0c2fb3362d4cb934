//! Statistics generation from the collector database
//!
//! This module provides functionality for extracting and displaying
//! store and run statistics from the storage layer.

use crate::state::EntryState;
use crate::storage::{RunRecord, Storage};
use crate::CollectorError;
use std::collections::HashMap;

/// Collector statistics summary
#[derive(Debug, Clone)]
pub struct CollectorStatistics {
    /// Number of stored authors
    pub authors: u64,

    /// Number of stored works
    pub contents: u64,

    /// Number of live search index entries
    pub search_entries: u64,

    /// Search entries with no content row; always zero in a healthy store
    pub orphaned_search_entries: u64,

    /// The most recent run, if any
    pub latest_run: Option<RunRecord>,

    /// Outcome counts of the most recent run
    pub outcomes_by_state: HashMap<EntryState, u64>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CollectorStatistics)` - Successfully loaded statistics
/// * `Err(CollectorError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<CollectorStatistics, CollectorError> {
    let authors = storage.count_authors()?;
    let contents = storage.count_contents()?;
    let search_entries = storage.count_search_entries()?;
    let orphaned_search_entries = storage.count_orphaned_search_entries()?;

    let latest_run = storage.get_latest_run()?;

    let mut outcomes_by_state = HashMap::new();
    if let Some(run) = &latest_run {
        for outcome in storage.get_outcomes(run.id)? {
            *outcomes_by_state.entry(outcome.state).or_insert(0) += 1;
        }
    }

    Ok(CollectorStatistics {
        authors,
        contents,
        search_entries,
        orphaned_search_entries,
        latest_run,
        outcomes_by_state,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CollectorStatistics) {
    println!("=== Collector Statistics ===\n");

    println!("Store:");
    println!("  Authors: {}", stats.authors);
    println!("  Works: {}", stats.contents);
    println!("  Search entries: {}", stats.search_entries);
    if stats.orphaned_search_entries > 0 {
        println!(
            "  Orphaned search entries: {} (store is inconsistent)",
            stats.orphaned_search_entries
        );
    }
    println!();

    let Some(run) = &stats.latest_run else {
        println!("No collection runs recorded.");
        return;
    };

    println!("Latest Run:");
    println!("  Run ID: {}", run.id);
    println!("  Status: {}", run.status.to_db_string());
    println!("  Started: {}", run.started_at);
    if let Some(finished) = &run.finished_at {
        println!("  Finished: {}", finished);
    }
    println!(
        "  discovered {}, indexed {}, skipped {}, failed {}",
        run.counts.discovered, run.counts.indexed, run.counts.skipped, run.counts.failed
    );
    println!();

    if !stats.outcomes_by_state.is_empty() {
        println!("Outcomes by State:");
        let mut state_counts: Vec<_> = stats.outcomes_by_state.iter().collect();
        state_counts.sort_by(|a, b| b.1.cmp(a.1));

        for (state, count) in state_counts {
            println!("  {}: {}", state, count);
        }
        println!();
    }

    let success_rate = if run.counts.discovered > 0 {
        (run.counts.indexed as f64 / run.counts.discovered as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Success Rate: {:.1}% ({} / {} entries indexed)",
        success_rate, run.counts.indexed, run.counts.discovered
    );
}
