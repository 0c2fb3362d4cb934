//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{
    AuthorRecord, ContentRecord, IndexDocument, OutcomeRecord, RunCounts, RunRecord, RunStatus,
    SearchHit,
};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the collector.
/// Callers share one backend across workers behind a mutex.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new run and returns its ID
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Marks a run finished with its final status and tallies
    fn finish_run(&mut self, run_id: i64, status: RunStatus, counts: RunCounts)
        -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Records the final state of one entry
    fn record_outcome(&mut self, run_id: i64, outcome: &OutcomeRecord) -> StorageResult<()>;

    /// Gets all outcomes recorded for a run, in recording order
    fn get_outcomes(&self, run_id: i64) -> StorageResult<Vec<OutcomeRecord>>;

    // ===== Indexing =====

    /// Writes author, content and search entry for one work atomically
    ///
    /// The author row is upserted, the content row is updated in place (or
    /// inserted) keyed by (author_id, title_id), and the search entry for the
    /// content's document identifier is replaced. Either all three writes land
    /// or none do.
    ///
    /// # Returns
    ///
    /// The document identifier of the content row
    fn index_document(&mut self, doc: &IndexDocument<'_>) -> StorageResult<i64>;

    /// Gets an author by ID
    fn get_author(&self, author_id: &str) -> StorageResult<Option<AuthorRecord>>;

    /// Gets a content row by its logical key
    fn get_content(&self, author_id: &str, title_id: &str) -> StorageResult<Option<ContentRecord>>;

    // ===== Query Surface =====

    /// Runs a full-text query over the segmented content
    ///
    /// `query` uses FTS5 syntax (`termA AND termB`, `"a phrase"`, `OR`, `NOT`).
    /// Hits are ordered by author ID, then title ID.
    fn search(&self, query: &str) -> StorageResult<Vec<SearchHit>>;

    // ===== Statistics =====

    /// Counts author rows
    fn count_authors(&self) -> StorageResult<u64>;

    /// Counts content rows
    fn count_contents(&self) -> StorageResult<u64>;

    /// Counts search index entries
    fn count_search_entries(&self) -> StorageResult<u64>;

    /// Counts search entries whose document identifier has no content row
    fn count_orphaned_search_entries(&self) -> StorageResult<u64>;
}
