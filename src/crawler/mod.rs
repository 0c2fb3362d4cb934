//! Crawler module for the collection pipeline
//!
//! This module contains the pipeline stages, including:
//! - HTTP fetching with retry logic and timeouts
//! - Entry discovery on the listing page
//! - Detail page resolution (author and archive link)
//! - Archive download and Shift_JIS text extraction
//! - Overall run coordination on a bounded worker pool

mod archive;
mod coordinator;
mod detail;
mod discovery;
mod fetcher;

pub use archive::{decode_shift_jis, extract_text, fetch_and_extract};
pub use coordinator::{process_entry, run_collection, Coordinator, EntryOutcome, RunSummary};
pub use detail::{parse_detail, resolve_detail, resolve_zip_url, DetailPage};
pub use discovery::{discover, parse_listing};
pub use fetcher::{build_http_client, FetchedPage, Fetcher};

use crate::config::Config;
use crate::index::JiebaSegmenter;
use crate::CollectorError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs a complete collection with the default segmenter
///
/// This is the main entry point for a collection. It will:
/// 1. Open the store named in the configuration
/// 2. Record a new run
/// 3. Discover entries on the listing page
/// 4. Resolve, extract and index every entry concurrently
/// 5. Return the run summary
///
/// # Arguments
///
/// * `config` - The collector configuration
/// * `config_hash` - Hash of the config file the run was started from
/// * `cancel` - Token that stops dispatch when cancelled
///
/// # Returns
///
/// * `Ok(RunSummary)` - The run finished or was interrupted
/// * `Err(CollectorError)` - The listing could not be fetched or storage failed
pub async fn collect(
    config: Config,
    config_hash: impl Into<String>,
    cancel: CancellationToken,
) -> Result<RunSummary, CollectorError> {
    run_collection(config, config_hash, Arc::new(JiebaSegmenter::new()), cancel).await
}
