//! Checking out the chain source a launch is built from.

use std::{
    fs,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{error::FetchError, runtime::CommandExt};

/// Which revision of the source to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRef {
    Branch(String),
    Tag(String),
    Hash(String),
    /// An existing checkout, used in place.
    Local(PathBuf),
}

/// A checked-out source tree and the commit it is at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedSource {
    pub path: PathBuf,
    pub hash: String,
}

#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Makes `source` available at `target`.
    ///
    /// On error or cancellation `target` is left as it was.
    async fn fetch(
        &self,
        source: &SourceRef,
        target: &Path,
        cancel: &CancellationToken,
    ) -> Result<FetchedSource, FetchError>;
}

#[derive(Debug, Clone)]
pub struct GitSourceFetcher {
    repository: String,
    git: PathBuf,
}

impl GitSourceFetcher {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            git: PathBuf::from("git"),
        }
    }

    /// Uses `git` instead of the `git` found on `PATH`.
    pub fn with_git(mut self, git: impl Into<PathBuf>) -> Self {
        self.git = git.into();
        self
    }

    fn git(&self, dir: &Path) -> Command {
        let mut command = Command::new(&self.git);
        command.arg("-C").arg(dir);
        command
    }

    /// Commit hash of `HEAD` in the checkout at `dir`.
    pub async fn head(&self, dir: &Path) -> Result<String, FetchError> {
        let output = self
            .git(dir)
            .args(["rev-parse", "HEAD"])
            .spawn_and_wait_for_stdout()
            .await?;
        Ok(output.trim().to_string())
    }

    async fn checkout(&self, source: &SourceRef, dir: &Path) -> Result<String, FetchError> {
        let mut clone = Command::new(&self.git);
        clone.args(["clone", "--quiet"]);
        match source {
            SourceRef::Branch(name) | SourceRef::Tag(name) => {
                clone.args(["--depth", "1", "--branch", name.as_str()]);
            }
            SourceRef::Hash(_) | SourceRef::Local(_) => {}
        }
        clone.arg(&self.repository).arg(dir).spawn_and_wait().await?;

        if let SourceRef::Hash(hash) = source {
            self.git(dir)
                .args(["checkout", "--quiet", hash.as_str()])
                .spawn_and_wait()
                .await?;
        }

        self.head(dir).await
    }
}

#[async_trait]
impl SourceFetcher for GitSourceFetcher {
    async fn fetch(
        &self,
        source: &SourceRef,
        target: &Path,
        cancel: &CancellationToken,
    ) -> Result<FetchedSource, FetchError> {
        if let SourceRef::Local(path) = source {
            let hash = self.head(path).await?;
            return Ok(FetchedSource {
                path: path.clone(),
                hash,
            });
        }

        info!("📥 Fetching {} ({:?})", self.repository, source);
        let parent = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;
        let staging = tempfile::Builder::new()
            .prefix(".fetch-")
            .tempdir_in(parent)?;

        // Dropping the checkout kills git; dropping `staging` removes the partial tree.
        let hash = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            hash = self.checkout(source, staging.path()) => hash?,
        };

        if target.exists() {
            fs::remove_dir_all(target)?;
        }
        fs::rename(staging.path(), target)?;
        debug!(%hash, target = %target.display(), "source checked out");

        Ok(FetchedSource {
            path: target.to_path_buf(),
            hash,
        })
    }
}
