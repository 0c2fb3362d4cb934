use crate::index::Segmenter;
use crate::state::Entry;
use crate::storage::{IndexDocument, SqliteStorage, Storage, StorageError};
use crate::CollectorError;
use std::sync::{Arc, Mutex};

/// Persists works into the store
///
/// Cloning is cheap; every clone shares the same store and segmenter.
#[derive(Clone)]
pub struct Indexer {
    storage: Arc<Mutex<SqliteStorage>>,
    segmenter: Arc<dyn Segmenter>,
}

impl Indexer {
    pub fn new(storage: Arc<Mutex<SqliteStorage>>, segmenter: Arc<dyn Segmenter>) -> Self {
        Self { storage, segmenter }
    }

    /// Segments `text` into the indexed field: tokens joined by single spaces
    pub fn segment(&self, text: &str) -> String {
        self.segmenter.segment(text).join(" ")
    }

    /// Indexes one work
    ///
    /// Upserts the author, upserts the content keyed by (author_id, title_id),
    /// then replaces the search entry for the content's document identifier.
    /// The three writes share one transaction, so concurrent calls for the
    /// same key never interleave and a failed call leaves no partial state.
    ///
    /// Segmentation runs before the store lock is taken.
    ///
    /// # Returns
    ///
    /// * `Ok(i64)` - Document identifier of the content row
    /// * `Err(CollectorError::StoreWriteFailed)` - Any write failed
    pub fn index_blocking(&self, entry: &Entry, text: &str) -> Result<i64, CollectorError> {
        let words = self.segment(text);

        let mut storage = self
            .storage
            .lock()
            .map_err(|_| CollectorError::StoreWriteFailed(StorageError::LockPoisoned))?;

        let document_id = storage
            .index_document(&IndexDocument {
                author_id: &entry.author_id,
                author: &entry.author,
                title_id: &entry.title_id,
                title: &entry.title,
                content: text,
                words: &words,
            })
            .map_err(CollectorError::StoreWriteFailed)?;

        tracing::debug!(
            "Indexed {} as document {} ({} bytes of words)",
            entry.key(),
            document_id,
            words.len()
        );

        Ok(document_id)
    }

    /// Runs `index_blocking` on the blocking thread pool
    pub async fn index(&self, entry: &Entry, text: String) -> Result<i64, CollectorError> {
        let indexer = self.clone();
        let entry = entry.clone();

        tokio::task::spawn_blocking(move || indexer.index_blocking(&entry, &text))
            .await
            .map_err(|e| {
                CollectorError::StoreWriteFailed(StorageError::Database(format!(
                    "indexing task failed: {}",
                    e
                )))
            })?
    }
}
