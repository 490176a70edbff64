use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use launchpad_common::utils::time::epoch;
use launchpad_genesis::COORDINATOR_PREFIX;
use serde::{Deserialize, Serialize};

use crate::{chain::ChainOptions, home::home_for_launch, source::SourceRef};

/// Overrides the base directory for homes, sources, binaries and the binary cache.
pub const LAUNCHPAD_HOME_ENV: &str = "LAUNCHPAD_HOME";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchConfig {
    #[serde(default)]
    pub launch_id: Option<u64>,
    pub chain_id: String,
    pub source_url: String,
    pub source: SourceRef,
    /// Node home; derived from the launch when unset.
    #[serde(default)]
    pub home: Option<PathBuf>,
    #[serde(default)]
    pub genesis_url: Option<String>,
    #[serde(default)]
    pub genesis_hash: Option<String>,
    #[serde(default = "epoch")]
    pub launch_time: DateTime<Utc>,
    pub binary_name: String,
    #[serde(default = "default_moniker")]
    pub moniker: String,
    #[serde(default = "default_coordinator_prefix")]
    pub coordinator_prefix: String,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Where sources are checked out; derived from the launch when unset.
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

fn default_moniker() -> String {
    "launchpad".to_string()
}

fn default_coordinator_prefix() -> String {
    COORDINATOR_PREFIX.to_string()
}

impl LaunchConfig {
    pub fn new(
        chain_id: impl Into<String>,
        source_url: impl Into<String>,
        source: SourceRef,
        binary_name: impl Into<String>,
    ) -> Self {
        Self {
            launch_id: None,
            chain_id: chain_id.into(),
            source_url: source_url.into(),
            source,
            home: None,
            genesis_url: None,
            genesis_hash: None,
            launch_time: epoch(),
            binary_name: binary_name.into(),
            moniker: default_moniker(),
            coordinator_prefix: default_coordinator_prefix(),
            cache_dir: None,
            work_dir: None,
        }
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        fs::write(path, json)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(config)
    }

    /// Identifies the launch on disk: `launch-<id>`, or `chain-<chain_id>` without one.
    ///
    /// The two namespaces never overlap. Chain ids are reduced to `[A-Za-z0-9._-]`
    /// and prefixed, so the key is always a single ordinary path component.
    pub fn launch_key(&self) -> String {
        match self.launch_id {
            Some(id) => format!("launch-{}", id),
            None => format!("chain-{}", sanitize_key(&self.chain_id)),
        }
    }

    pub fn home_dir(&self, base: &Path) -> PathBuf {
        self.home
            .clone()
            .unwrap_or_else(|| home_for_launch(base, &self.launch_key()))
    }

    pub fn source_dir(&self, base: &Path) -> PathBuf {
        match &self.source {
            SourceRef::Local(path) => path.clone(),
            _ => self
                .work_dir
                .clone()
                .unwrap_or_else(|| base.join("src"))
                .join(self.launch_key()),
        }
    }

    pub fn binary_path(&self, base: &Path) -> PathBuf {
        base.join("bin")
            .join(self.launch_key())
            .join(&self.binary_name)
    }

    pub fn cache_dir(&self, base: &Path) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| base.to_path_buf())
    }

    pub fn chain_options(&self) -> ChainOptions {
        ChainOptions {
            launch_id: self.launch_id,
            chain_id: self.chain_id.clone(),
            genesis_url: self.genesis_url.clone(),
            genesis_hash: self.genesis_hash.clone(),
            launch_time: self.launch_time,
        }
    }
}

fn sanitize_key(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '_',
        })
        .collect()
}

/// `$LAUNCHPAD_HOME`, or `~/.launchpad`.
pub fn default_base_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(LAUNCHPAD_HOME_ENV) {
        return PathBuf::from(dir);
    }
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".launchpad")
}
