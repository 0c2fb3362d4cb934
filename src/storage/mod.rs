//! Storage module for persisting collected works
//!
//! This module handles all database operations for the collector, including:
//! - SQLite database initialization and schema management
//! - Author and content upserts with a stable document identifier
//! - The FTS5 search index and its query surface
//! - Run tracking and per-entry outcome records

mod schema;
mod sqlite;
mod traits;

pub use schema::SCHEMA_VERSION;
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::EntryState;
use crate::CollectorError;

use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, CollectorError> {
    SqliteStorage::new(path)
}

/// An author row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorRecord {
    pub author_id: String,
    pub author: String,
}

/// A content row; `id` is the document identifier shared with the search index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    pub id: i64,
    pub author_id: String,
    pub title_id: String,
    pub title: String,
    pub content: String,
    pub indexed_at: String,
}

/// Everything one `index` call writes, in a single transaction
#[derive(Debug, Clone)]
pub struct IndexDocument<'a> {
    pub author_id: &'a str,
    pub author: &'a str,
    pub title_id: &'a str,
    pub title: &'a str,
    pub content: &'a str,
    /// Word-segmented content, tokens separated by single spaces
    pub words: &'a str,
}

/// One match from a full-text query, joined back to author and title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub author_id: String,
    pub title_id: String,
    pub author: String,
    pub title: String,
}

/// Final state of one entry in a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeRecord {
    pub author_id: String,
    pub title_id: String,
    pub title: String,
    pub state: EntryState,
    pub reason: Option<String>,
}

/// Represents a collection run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub counts: RunCounts,
}

/// Per-run entry tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub discovered: u64,
    pub indexed: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// Status of a collection run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
