//! Aozora Collector: a full-text indexer for a literary archive
//!
//! This crate walks an author's listing page, resolves each listed work to its
//! downloadable archive, decodes the Shift_JIS text inside, and indexes it into
//! a SQLite full-text store keyed by author and title.

pub mod config;
pub mod crawler;
pub mod index;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for collector operations
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Malformed URL: {0}")]
    MalformedUrl(#[from] UrlError),

    #[error("Fetch failed for {url}{}: {message}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    FetchFailed {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Archive is corrupt: {0}")]
    ArchiveCorrupt(String),

    #[error("No .txt member found in archive")]
    MemberNotFound,

    #[error("Failed to decode Shift_JIS text: {0}")]
    EncodingError(String),

    #[error("Store write failed: {0}")]
    StoreWriteFailed(storage::StorageError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CollectorError {
    /// Returns true if retrying the same request may succeed
    ///
    /// Timeouts, transport failures without a status, HTTP 429 and 5xx
    /// responses are transient. Everything else is final.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::FetchFailed { status: None, .. } => true,
            Self::FetchFailed {
                status: Some(code), ..
            } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),
}

/// Result type alias for collector operations
pub type Result<T> = std::result::Result<T, CollectorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use index::{Indexer, JiebaSegmenter, Segmenter};
pub use state::{Entry, EntryState};
pub use crate::url::resolve;
