//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::EntryState;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    AuthorRecord, ContentRecord, IndexDocument, OutcomeRecord, RunCounts, RunRecord, RunStatus,
    SearchHit,
};
use crate::CollectorError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(CollectorError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, CollectorError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, CollectorError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
        Ok(RunRecord {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            config_hash: row.get(3)?,
            status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                .unwrap_or(RunStatus::Running),
            counts: RunCounts {
                discovered: row.get(5)?,
                indexed: row.get(6)?,
                skipped: row.get(7)?,
                failed: row.get(8)?,
            },
        })
    }

    fn count(&self, query: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(query, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

const RUN_COLUMNS: &str =
    "id, started_at, finished_at, config_hash, status, discovered, indexed, skipped, failed";

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        counts: RunCounts,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, discovered = ?3, indexed = ?4,
             skipped = ?5, failed = ?6 WHERE id = ?7",
            params![
                status.to_db_string(),
                now,
                counts.discovered,
                counts.indexed,
                counts.skipped,
                counts.failed,
                run_id
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let query = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&query, params![run_id], Self::run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let query = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        let run = self
            .conn
            .query_row(&query, [], Self::run_from_row)
            .optional()?;
        Ok(run)
    }

    fn record_outcome(&mut self, run_id: i64, outcome: &OutcomeRecord) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO entry_outcomes (run_id, author_id, title_id, title, state, reason, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run_id,
                outcome.author_id,
                outcome.title_id,
                outcome.title,
                outcome.state.to_db_string(),
                outcome.reason,
                now
            ],
        )?;
        Ok(())
    }

    fn get_outcomes(&self, run_id: i64) -> StorageResult<Vec<OutcomeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT author_id, title_id, title, state, reason FROM entry_outcomes
             WHERE run_id = ?1 ORDER BY id",
        )?;

        let outcomes = stmt
            .query_map(params![run_id], |row| {
                Ok(OutcomeRecord {
                    author_id: row.get(0)?,
                    title_id: row.get(1)?,
                    title: row.get(2)?,
                    state: EntryState::from_db_string(&row.get::<_, String>(3)?)
                        .unwrap_or(EntryState::Failed),
                    reason: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(outcomes)
    }

    // ===== Indexing =====

    fn index_document(&mut self, doc: &IndexDocument<'_>) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO authors (author_id, author) VALUES (?1, ?2)
             ON CONFLICT(author_id) DO UPDATE SET author = excluded.author",
            params![doc.author_id, doc.author],
        )?;

        // Update in place so the row keeps its id
        tx.execute(
            "INSERT INTO contents (author_id, title_id, title, content, indexed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(author_id, title_id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                indexed_at = excluded.indexed_at",
            params![doc.author_id, doc.title_id, doc.title, doc.content, now],
        )?;

        let document_id: i64 = tx.query_row(
            "SELECT id FROM contents WHERE author_id = ?1 AND title_id = ?2",
            params![doc.author_id, doc.title_id],
            |row| row.get(0),
        )?;

        tx.execute(
            "DELETE FROM contents_fts WHERE rowid = ?1",
            params![document_id],
        )?;
        tx.execute(
            "INSERT INTO contents_fts (rowid, words) VALUES (?1, ?2)",
            params![document_id, doc.words],
        )?;

        tx.commit()?;
        Ok(document_id)
    }

    fn get_author(&self, author_id: &str) -> StorageResult<Option<AuthorRecord>> {
        let author = self
            .conn
            .query_row(
                "SELECT author_id, author FROM authors WHERE author_id = ?1",
                params![author_id],
                |row| {
                    Ok(AuthorRecord {
                        author_id: row.get(0)?,
                        author: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(author)
    }

    fn get_content(&self, author_id: &str, title_id: &str) -> StorageResult<Option<ContentRecord>> {
        let content = self
            .conn
            .query_row(
                "SELECT id, author_id, title_id, title, content, indexed_at FROM contents
                 WHERE author_id = ?1 AND title_id = ?2",
                params![author_id, title_id],
                |row| {
                    Ok(ContentRecord {
                        id: row.get(0)?,
                        author_id: row.get(1)?,
                        title_id: row.get(2)?,
                        title: row.get(3)?,
                        content: row.get(4)?,
                        indexed_at: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(content)
    }

    // ===== Query Surface =====

    fn search(&self, query: &str) -> StorageResult<Vec<SearchHit>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.author_id, c.title_id, COALESCE(a.author, ''), c.title
             FROM contents_fts f
             JOIN contents c ON c.id = f.rowid
             LEFT JOIN authors a ON a.author_id = c.author_id
             WHERE contents_fts MATCH ?1
             ORDER BY c.author_id, c.title_id",
        )?;

        let hits = stmt
            .query_map(params![query], |row| {
                Ok(SearchHit {
                    author_id: row.get(0)?,
                    title_id: row.get(1)?,
                    author: row.get(2)?,
                    title: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(hits)
    }

    // ===== Statistics =====

    fn count_authors(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM authors")
    }

    fn count_contents(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM contents")
    }

    fn count_search_entries(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM contents_fts")
    }

    fn count_orphaned_search_entries(&self) -> StorageResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM contents_fts f
             WHERE NOT EXISTS (SELECT 1 FROM contents c WHERE c.id = f.rowid)",
        )
    }
}
