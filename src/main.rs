//! fetch-webpage main entry point
//!
//! This is the command-line interface for capturing web pages locally.

use anyhow::{bail, Context};
use clap::Parser;
use fetch_webpage::config::{load_config, validate, Config};
use fetch_webpage::{FetchError, FetchMetadata, Fetcher, FsStorage, HttpDownloader};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// fetch-webpage: save web pages for offline viewing
///
/// Each URL is saved as `<host>.html` next to a `<host>.html_assets`
/// directory holding its images, stylesheets and scripts. All URLs are
/// fetched concurrently.
#[derive(Parser, Debug)]
#[command(name = "fetch-webpage")]
#[command(version)]
#[command(about = "Save web pages with their images, stylesheets and scripts", long_about = None)]
struct Cli {
    /// Pages to fetch
    #[arg(value_name = "URL", required = true)]
    urls: Vec<String>,

    /// Print metadata for every fetched page
    #[arg(long)]
    metadata: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of concurrent downloads (overrides the config file)
    #[arg(short = 'j', long, value_name = "N")]
    parallelism: Option<usize>,

    /// Directory to write pages into (overrides the config file)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = resolve_config(&cli)?;
    let show_metadata = cli.metadata;

    handle_fetch(config, cli.urls, show_metadata).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fetch_webpage=info,warn"),
            1 => EnvFilter::new("fetch_webpage=debug,info"),
            2 => EnvFilter::new("fetch_webpage=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the config file if one was given and applies command-line overrides
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load config {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(parallelism) = cli.parallelism {
        config.downloader.parallelism = Some(parallelism);
    }
    if let Some(dir) = &cli.output_dir {
        config.output.root_dir = dir.display().to_string();
    }

    validate(&config).context("invalid configuration")?;
    Ok(config)
}

/// Fetches every URL concurrently and reports the outcome of each
async fn handle_fetch(config: Config, urls: Vec<String>, show_metadata: bool) -> anyhow::Result<()> {
    let downloader = HttpDownloader::from_config(
        &config.downloader,
        tracing::info_span!("downloader"),
    )
    .context("failed to build HTTP client")?;
    let storage = FsStorage::new(config.output.root_path());
    let fetcher = Arc::new(Fetcher::new(
        Arc::new(downloader),
        Arc::new(storage),
        tracing::info_span!("fetcher"),
    ));

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling downloads");
                cancel.cancel();
            }
        })
    };

    tracing::info!(
        "Fetching {} page(s) into {}",
        urls.len(),
        config.output.root_dir
    );

    let mut tasks = JoinSet::new();
    for (index, url) in urls.iter().cloned().enumerate() {
        let fetcher = Arc::clone(&fetcher);
        let cancel = cancel.clone();
        tasks.spawn(async move { (index, fetcher.fetch(&cancel, &url).await) });
    }

    let outcomes = drain_fetches(tasks, urls.len()).await;
    interrupt.abort();

    let mut failures = Vec::new();
    for (url, result) in urls.iter().zip(outcomes) {
        match result {
            Ok(metadata) => {
                tracing::info!("Saved {} as {}", url, metadata.document_path.display());
                if show_metadata {
                    println!("{}", format_metadata(&metadata));
                }
            }
            Err(e) => {
                tracing::error!("Failed to fetch {}: {}", url, e);
                failures.push(format!("{}: {}", url, e));
            }
        }
    }

    if !failures.is_empty() {
        bail!(
            "failed to fetch {} of {} web page(s):\n{}",
            failures.len(),
            urls.len(),
            failures.join("\n")
        );
    }

    Ok(())
}

/// Waits for every fetch task and returns the outcomes in input order
///
/// A task that panicked or was aborted is reported as a failure of its URL.
async fn drain_fetches(
    mut tasks: JoinSet<(usize, Result<FetchMetadata, FetchError>)>,
    count: usize,
) -> Vec<Result<FetchMetadata, String>> {
    let mut outcomes: Vec<Option<Result<FetchMetadata, String>>> = vec![None; count];

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => {
                if let Some(slot) = outcomes.get_mut(index) {
                    *slot = Some(result.map_err(|e| e.to_string()));
                }
            }
            Err(e) => tracing::error!("Fetch task failed: {}", e),
        }
    }

    outcomes
        .into_iter()
        .map(|outcome| outcome.unwrap_or_else(|| Err("fetch task panicked".to_string())))
        .collect()
}

fn format_metadata(metadata: &FetchMetadata) -> String {
    format!(
        "{}\n- num_links: {}\n- images: {}\n- last_fetched_at: {}\n",
        metadata.url,
        metadata.link_count,
        metadata.image_count,
        metadata.fetched_at.format("%a, %d %b %Y %H:%M:%S UTC")
    )
}
