//! Retrieval of a genesis document published over HTTP.

use async_trait::async_trait;
use launchpad_common::crypto::digest;
use tracing::debug;

use crate::error::FetchError;

#[async_trait]
pub trait GenesisFetcher: Send + Sync {
    /// Returns the raw body served at `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpGenesisFetcher {
    client: reqwest::Client,
}

impl HttpGenesisFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GenesisFetcher for HttpGenesisFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!(%url, "fetching genesis");
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Fetches the genesis at `url` together with its SHA-256 hash.
pub async fn genesis_and_hash(
    fetcher: &dyn GenesisFetcher,
    url: &str,
) -> Result<(Vec<u8>, String), FetchError> {
    let genesis = fetcher.fetch(url).await?;
    let hash = digest(&genesis);
    Ok((genesis, hash))
}
