//! Launch-scoped record of which binary was built from which source.
//!
//! The document maps a launch id to `sha256(binary_hash ‖ source_hash)`. It is
//! shared by every launch on the machine, so each access takes an exclusive
//! lock on a sibling `.lock` file and writes go through a temporary file that
//! is renamed into place.

use std::{
    collections::BTreeMap,
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use fs4::fs_std::FileExt;
use launchpad_common::crypto::checksum_strings;
use thiserror::Error;
use tracing::{debug, warn};

pub const BINARY_CACHE_DIRECTORY: &str = "binary-cache";
pub const BINARY_CACHE_FILENAME: &str = "checksums.json";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to lock the binary cache at {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("binary cache IO error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed binary cache document: {0}")]
    Serialization(#[from] serde_json::Error),
}

type Checksums = BTreeMap<String, String>;

#[derive(Debug, Clone)]
pub struct BinaryCache {
    path: PathBuf,
}

/// Releases the cache lock when dropped.
struct CacheLock(File);

impl Drop for CacheLock {
    fn drop(&mut self) {
        if let Err(error) = FileExt::unlock(&self.0) {
            warn!("Failed to unlock binary cache: {error}");
        }
    }
}

impl BinaryCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The cache document at its conventional place under `cache_dir`.
    pub fn in_dir(cache_dir: &Path) -> Self {
        Self::new(
            cache_dir
                .join(BINARY_CACHE_DIRECTORY)
                .join(BINARY_CACHE_FILENAME),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cache_binary_for_launch_id(
        &self,
        launch_id: u64,
        binary_hash: &str,
        source_hash: &str,
    ) -> Result<(), CacheError> {
        let _lock = self.lock()?;
        let mut checksums = self.load()?;
        checksums.insert(launch_id.to_string(), compound_hash(binary_hash, source_hash));
        self.store(&checksums)?;
        debug!(launch_id, path = %self.path.display(), "cached binary checksum");
        Ok(())
    }

    /// Whether the cached checksum for `launch_id` matches; a missing entry is a miss.
    pub fn check_binary_cache_for_launch_id(
        &self,
        launch_id: u64,
        binary_hash: &str,
        source_hash: &str,
    ) -> Result<bool, CacheError> {
        let _lock = self.lock()?;
        let checksums = self.load()?;
        Ok(checksums
            .get(&launch_id.to_string())
            .is_some_and(|cached| *cached == compound_hash(binary_hash, source_hash)))
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn lock(&self) -> Result<CacheLock, CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        file.lock_exclusive()
            .map_err(|source| CacheError::Lock { path, source })?;
        Ok(CacheLock(file))
    }

    fn load(&self) -> Result<Checksums, CacheError> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Checksums::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Checksums::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn store(&self, checksums: &Checksums) -> Result<(), CacheError> {
        let temp = self.path.with_extension("json.new");
        fs::write(&temp, serde_json::to_vec_pretty(checksums)?)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

/// `sha256(binary_hash ‖ source_hash)`, hex encoded.
pub fn compound_hash(binary_hash: &str, source_hash: &str) -> String {
    checksum_strings(&[binary_hash, source_hash])
}
