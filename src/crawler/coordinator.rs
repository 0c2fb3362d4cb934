//! Collection coordinator - the pipeline driver
//!
//! This module runs one collection pass:
//! - Recording the run in storage
//! - Discovering entries on the listing page
//! - Driving each entry through detail resolution, extraction and indexing
//!   on a bounded worker pool
//! - Recording every entry's terminal state and the run summary
//! - Stopping dispatch promptly on cancellation

use crate::config::Config;
use crate::crawler::archive::fetch_and_extract;
use crate::crawler::detail::resolve_detail;
use crate::crawler::discovery::discover;
use crate::crawler::fetcher::Fetcher;
use crate::index::{Indexer, Segmenter};
use crate::state::{Entry, EntryState};
use crate::storage::{
    OutcomeRecord, RunCounts, RunStatus, SqliteStorage, Storage, StorageError,
};
use crate::CollectorError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tokio_util::sync::CancellationToken;

/// Terminal result of one entry's pipeline pass
#[derive(Debug, Clone)]
pub struct EntryOutcome {
    /// The entry as far as it was resolved
    pub entry: Entry,

    /// One of `Indexed`, `SkippedNoZip` or `Failed`
    pub state: EntryState,

    /// Why the entry did not reach `Indexed`
    pub reason: Option<String>,

    /// Document identifier of the stored content, when indexed
    pub document_id: Option<i64>,
}

impl EntryOutcome {
    fn indexed(entry: Entry, document_id: i64) -> Self {
        Self {
            entry,
            state: EntryState::Indexed,
            reason: None,
            document_id: Some(document_id),
        }
    }

    fn skipped(entry: Entry) -> Self {
        Self {
            entry,
            state: EntryState::SkippedNoZip,
            reason: Some("no archive link on detail page".to_string()),
            document_id: None,
        }
    }

    fn failed(entry: Entry, stage: EntryState, error: &CollectorError) -> Self {
        debug_assert!(stage.can_transition_to(EntryState::Failed));
        let step = match stage {
            EntryState::Discovered => "detail page",
            EntryState::DetailResolved => "archive",
            _ => "index",
        };
        Self {
            entry,
            state: EntryState::Failed,
            reason: Some(format!("{}: {}", step, error)),
            document_id: None,
        }
    }

    fn panicked(entry: Entry) -> Self {
        Self {
            entry,
            state: EntryState::Failed,
            reason: Some("worker panicked".to_string()),
            document_id: None,
        }
    }

    fn to_record(&self) -> OutcomeRecord {
        OutcomeRecord {
            author_id: self.entry.author_id.clone(),
            title_id: self.entry.title_id.clone(),
            title: self.entry.title.clone(),
            state: self.state,
            reason: self.reason.clone(),
        }
    }
}

/// Summary of one collection run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: i64,

    /// Number of entries found on the listing page
    pub discovered: usize,

    /// Entries never handed to a worker because the run was cancelled
    pub not_dispatched: usize,

    /// True if the run stopped dispatching early
    pub interrupted: bool,

    pub elapsed: Duration,

    /// Terminal outcomes, in completion order
    pub outcomes: Vec<EntryOutcome>,
}

impl RunSummary {
    fn count(&self, state: EntryState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }

    pub fn indexed(&self) -> usize {
        self.count(EntryState::Indexed)
    }

    pub fn skipped(&self) -> usize {
        self.count(EntryState::SkippedNoZip)
    }

    pub fn failed(&self) -> usize {
        self.count(EntryState::Failed)
    }

    /// Counts as persisted on the run row
    pub fn counts(&self) -> RunCounts {
        RunCounts {
            discovered: self.discovered as u64,
            indexed: self.indexed() as u64,
            skipped: self.skipped() as u64,
            failed: self.failed() as u64,
        }
    }
}

/// Main pipeline driver structure
pub struct Coordinator {
    config: Arc<Config>,
    storage: Arc<Mutex<SqliteStorage>>,
    fetcher: Fetcher,
    indexer: Indexer,
    config_hash: String,
}

impl Coordinator {
    /// Creates a coordinator backed by the database named in the config
    ///
    /// # Arguments
    ///
    /// * `config` - The collector configuration
    /// * `config_hash` - Hash of the config file, stored on the run row
    /// * `segmenter` - Word segmenter used by the indexer
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CollectorError)` - Failed to open storage or build the client
    pub fn new(
        config: Config,
        config_hash: impl Into<String>,
        segmenter: Arc<dyn Segmenter>,
    ) -> Result<Self, CollectorError> {
        let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
        Self::with_storage(config, storage, segmenter, config_hash)
    }

    /// Creates a coordinator around an already opened store
    pub fn with_storage(
        config: Config,
        storage: SqliteStorage,
        segmenter: Arc<dyn Segmenter>,
        config_hash: impl Into<String>,
    ) -> Result<Self, CollectorError> {
        let fetcher = Fetcher::from_config(&config)?;
        let storage = Arc::new(Mutex::new(storage));
        let indexer = Indexer::new(Arc::clone(&storage), segmenter);

        Ok(Self {
            config: Arc::new(config),
            storage,
            fetcher,
            indexer,
            config_hash: config_hash.into(),
        })
    }

    /// Shared handle to the backing store
    pub fn storage(&self) -> Arc<Mutex<SqliteStorage>> {
        Arc::clone(&self.storage)
    }

    /// Runs one collection pass
    ///
    /// A listing page that cannot be fetched is fatal: the run is marked
    /// failed and the error returned. Every other failure is confined to its
    /// entry and reported in the summary.
    ///
    /// Cancelling `cancel` stops dispatching new entries; entries already
    /// dispatched finish or fail within their request timeouts.
    pub async fn run(&self, cancel: CancellationToken) -> Result<RunSummary, CollectorError> {
        let start_time = Instant::now();
        let config_hash = self.config_hash.clone();
        let run_id =
            blocking_store(self.storage(), move |storage| storage.create_run(&config_hash)).await?;
        let listing_url = self.config.collector.listing_url.as_str();

        tracing::info!("Starting collection run {} for {}", run_id, listing_url);

        let entries = match discover(&self.fetcher, listing_url).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("Listing page {} could not be fetched: {}", listing_url, e);
                blocking_store(self.storage(), move |storage| {
                    storage.finish_run(run_id, RunStatus::Failed, RunCounts::default())
                })
                .await?;
                return Err(e);
            }
        };

        let discovered = entries.len();
        let semaphore = Arc::new(Semaphore::new(
            self.config.collector.max_concurrent_entries as usize,
        ));
        let completed = Arc::new(AtomicUsize::new(0));
        let mut workers = JoinSet::new();
        let mut in_flight = HashMap::new();
        let mut pending = entries.into_iter();
        let mut not_dispatched = 0;

        for entry in pending.by_ref() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                not_dispatched = 1;
                break;
            };

            let fetcher = self.fetcher.clone();
            let indexer = self.indexer.clone();
            let storage = Arc::clone(&self.storage);
            let completed = Arc::clone(&completed);
            let tracked = entry.clone();

            let handle = workers.spawn(async move {
                let _permit = permit;
                let outcome = process_entry(&fetcher, &indexer, entry).await;
                report_outcome(storage, run_id, &outcome).await;

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % 10 == 0 {
                    tracing::info!("Progress: {}/{} entries processed", done, discovered);
                }
                outcome
            });
            in_flight.insert(handle.id(), tracked);
        }
        not_dispatched += pending.len();

        let interrupted = not_dispatched > 0;
        if interrupted {
            tracing::warn!(
                "Collection cancelled, {} entries not dispatched; waiting for {} in flight",
                not_dispatched,
                workers.len()
            );
        }

        let outcomes = join_workers(&mut workers, in_flight, &self.storage, run_id).await;

        let summary = RunSummary {
            run_id,
            discovered,
            not_dispatched,
            interrupted,
            elapsed: start_time.elapsed(),
            outcomes,
        };

        let status = if interrupted {
            RunStatus::Interrupted
        } else {
            RunStatus::Completed
        };
        let counts = summary.counts();
        blocking_store(self.storage(), move |storage| {
            storage.finish_run(run_id, status, counts)
        })
        .await?;

        tracing::info!(
            "Collection run {} {}: discovered {}, indexed {}, skipped {}, failed {} in {:?}",
            run_id,
            status.to_db_string(),
            summary.discovered,
            summary.indexed(),
            summary.skipped(),
            summary.failed(),
            summary.elapsed
        );

        Ok(summary)
    }
}

/// Drives one entry from `Discovered` to a terminal state
///
/// Never returns an error: every failure becomes a `Failed` outcome naming
/// the stage it happened in.
pub async fn process_entry(fetcher: &Fetcher, indexer: &Indexer, mut entry: Entry) -> EntryOutcome {
    if let Err(e) = resolve_detail(fetcher, &mut entry).await {
        return EntryOutcome::failed(entry, EntryState::Discovered, &e);
    }

    let Some(zip_url) = entry.zip_url.clone() else {
        return EntryOutcome::skipped(entry);
    };

    let text = match fetch_and_extract(fetcher, &zip_url).await {
        Ok(text) => text,
        Err(e) => return EntryOutcome::failed(entry, EntryState::DetailResolved, &e),
    };

    match indexer.index(&entry, text).await {
        Ok(document_id) => EntryOutcome::indexed(entry, document_id),
        Err(e) => EntryOutcome::failed(entry, EntryState::Extracted, &e),
    }
}

/// Waits for every worker
///
/// A worker that panicked is reported as a failed outcome for the entry it
/// was spawned with.
async fn join_workers(
    workers: &mut JoinSet<EntryOutcome>,
    mut in_flight: HashMap<task::Id, Entry>,
    storage: &Arc<Mutex<SqliteStorage>>,
    run_id: i64,
) -> Vec<EntryOutcome> {
    let mut outcomes = Vec::with_capacity(in_flight.len());
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                tracing::error!("Entry worker failed: {}", e);
                let Some(entry) = in_flight.remove(&e.id()) else {
                    continue;
                };
                let outcome = EntryOutcome::panicked(entry);
                report_outcome(Arc::clone(storage), run_id, &outcome).await;
                outcomes.push(outcome);
            }
        }
    }
    outcomes
}

/// Runs a store operation under the lock on the blocking thread pool
async fn blocking_store<T, F>(
    storage: Arc<Mutex<SqliteStorage>>,
    operation: F,
) -> Result<T, StorageError>
where
    T: Send + 'static,
    F: FnOnce(&mut SqliteStorage) -> Result<T, StorageError> + Send + 'static,
{
    task::spawn_blocking(move || {
        let mut storage = storage.lock().map_err(|_| StorageError::LockPoisoned)?;
        operation(&mut *storage)
    })
    .await
    .map_err(|e| StorageError::Database(format!("storage task failed: {}", e)))?
}

/// Logs an outcome and stores it against the run
async fn report_outcome(
    storage: Arc<Mutex<SqliteStorage>>,
    run_id: i64,
    outcome: &EntryOutcome,
) {
    let key = outcome.entry.key();
    let reason = outcome.reason.as_deref().unwrap_or_default();
    match outcome.state {
        EntryState::Indexed => tracing::debug!("Indexed {} \"{}\"", key, outcome.entry.title),
        EntryState::SkippedNoZip => {
            tracing::warn!("Skipped {} \"{}\": {}", key, outcome.entry.title, reason)
        }
        _ => tracing::warn!("Failed {} \"{}\": {}", key, outcome.entry.title, reason),
    }

    let record = outcome.to_record();
    let result =
        blocking_store(storage, move |storage| storage.record_outcome(run_id, &record)).await;
    if let Err(e) = result {
        tracing::warn!("Failed to record outcome for {}: {}", key, e);
    }
}

/// Runs a complete collection with a fresh coordinator
pub async fn run_collection(
    config: Config,
    config_hash: impl Into<String>,
    segmenter: Arc<dyn Segmenter>,
    cancel: CancellationToken,
) -> Result<RunSummary, CollectorError> {
    let coordinator = Coordinator::new(config, config_hash, segmenter)?;
    coordinator.run(cancel).await
}
