//! Database schema definitions
//!
//! `contents.id` is the document identifier: the FTS5 row for a work uses the
//! same value as its rowid. Content rows are updated in place, so the identifier
//! of a given (author_id, title_id) never changes once assigned.

/// Current schema version, stored in `PRAGMA user_version`
pub const SCHEMA_VERSION: u32 = 1;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS authors (
    author_id TEXT PRIMARY KEY,
    author TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS contents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    author_id TEXT NOT NULL REFERENCES authors(author_id),
    title_id TEXT NOT NULL,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    indexed_at TEXT NOT NULL,
    UNIQUE(author_id, title_id)
);

CREATE INDEX IF NOT EXISTS idx_contents_author ON contents(author_id);

-- Word-segmented content; rowid = contents.id
CREATE VIRTUAL TABLE IF NOT EXISTS contents_fts USING fts5(words);

-- Track collection runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    discovered INTEGER NOT NULL DEFAULT 0,
    indexed INTEGER NOT NULL DEFAULT 0,
    skipped INTEGER NOT NULL DEFAULT 0,
    failed INTEGER NOT NULL DEFAULT 0
);

-- Final state of every entry a run dispatched
CREATE TABLE IF NOT EXISTS entry_outcomes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    author_id TEXT NOT NULL,
    title_id TEXT NOT NULL,
    title TEXT NOT NULL,
    state TEXT NOT NULL,
    reason TEXT,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_entry_outcomes_run ON entry_outcomes(run_id);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}
