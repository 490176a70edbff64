//! Wiring a [`Chain`] from a [`LaunchConfig`].

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use launchpad_genesis::Request;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    cache::BinaryCache,
    chain::Chain,
    config::LaunchConfig,
    error::FetchError,
    fetch::HttpGenesisFetcher,
    runtime::{ProcessOptions, ProcessRuntime},
    source::{FetchedSource, GitSourceFetcher, SourceFetcher},
};

/// Checks out the configured source under `base`.
pub async fn fetch_source(
    config: &LaunchConfig,
    base: &Path,
    cancel: &CancellationToken,
) -> Result<FetchedSource, FetchError> {
    let fetcher = GitSourceFetcher::new(&config.source_url);
    let source = fetcher
        .fetch(&config.source, &config.source_dir(base), cancel)
        .await?;
    info!("📦 Source at {} ({})", source.path.display(), source.hash);
    Ok(source)
}

/// A process-backed chain for `config`. `home` overrides the configured home.
pub fn process_chain(
    config: &LaunchConfig,
    base: &Path,
    source: FetchedSource,
    home: Option<PathBuf>,
) -> Chain<ProcessRuntime> {
    let runtime = ProcessRuntime::new(ProcessOptions {
        source_dir: source.path.clone(),
        binary_name: config.binary_name.clone(),
        binary_path: config.binary_path(base),
        home: home.unwrap_or_else(|| config.home_dir(base)),
        chain_id: config.chain_id.clone(),
        moniker: config.moniker.clone(),
    });

    Chain::new(
        source,
        config.chain_options(),
        runtime,
        Arc::new(HttpGenesisFetcher::default()),
    )
    .with_binary_cache(BinaryCache::in_dir(&config.cache_dir(base)))
}

/// Reads a JSON array of requests.
pub fn load_requests(path: impl AsRef<Path>) -> io::Result<Vec<Request>> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}
