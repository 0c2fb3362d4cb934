//! Aozora Collector main entry point
//!
//! This is the command-line interface for the Aozora Collector full-text indexer.

use aozora_collector::config::{load_config_with_hash, Config};
use aozora_collector::crawler::collect;
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Aozora Collector: a full-text indexer for a literary archive
///
/// Aozora Collector walks an author's listing page, downloads each listed
/// work's archive, decodes its text and indexes it into a SQLite full-text
/// store that can be searched by word.
#[derive(Parser, Debug)]
#[command(name = "aozora-collector")]
#[command(version)]
#[command(about = "A full-text indexer for a literary archive", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be collected without network access
    #[arg(long, conflicts_with_all = ["stats", "search"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "search"])]
    stats: bool,

    /// Run a full-text query against the database and exit
    #[arg(long, value_name = "QUERY", conflicts_with_all = ["dry_run", "stats"])]
    search: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(query) = &cli.search {
        handle_search(&config, query)?;
    } else {
        handle_collect(config, config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("aozora_collector=info,warn"),
            1 => EnvFilter::new("aozora_collector=debug,info"),
            2 => EnvFilter::new("aozora_collector=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be collected
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Aozora Collector Dry Run ===\n");

    println!("Collector Configuration:");
    println!("  Listing page: {}", config.collector.listing_url);
    println!(
        "  Max concurrent entries: {}",
        config.collector.max_concurrent_entries
    );
    println!(
        "  Request timeout: {}s (connect {}s)",
        config.collector.request_timeout_secs, config.collector.connect_timeout_secs
    );
    println!(
        "  Retries: {} (base delay {}ms)",
        config.collector.max_retries, config.collector.retry_delay_ms
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would collect every work listed on {}",
        config.collector.listing_url
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use aozora_collector::output::{load_statistics, print_statistics};
    use aozora_collector::storage::SqliteStorage;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --search mode: runs a full-text query
fn handle_search(config: &Config, query: &str) -> Result<(), Box<dyn std::error::Error>> {
    use aozora_collector::output::print_search_hits;
    use aozora_collector::storage::{SqliteStorage, Storage};
    use std::path::Path;

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let hits = storage.search(query)?;

    tracing::info!("{} match(es) for {}", hits.len(), query);
    print_search_hits(&hits);

    Ok(())
}

/// Handles the main collection run
async fn handle_collect(
    config: Config,
    config_hash: String,
) -> Result<(), Box<dyn std::error::Error>> {
    use aozora_collector::output::print_run_summary;

    tracing::info!(
        "Collecting from {} with {} workers",
        config.collector.listing_url,
        config.collector.max_concurrent_entries
    );

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight entries");
            interrupt.cancel();
        }
    });

    match collect(config, config_hash, cancel).await {
        Ok(summary) => {
            print_run_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Collection failed: {}", e);
            Err(e.into())
        }
    }
}
