//! On-disk layout of a node home and the edits the pipeline makes to it.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use launchpad_common::utils::time::genesis_time;
use serde_json::{Map, Value};
use toml_edit::{value, Document};

use crate::error::ChainError;

/// Paths inside a node home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainHome {
    root: PathBuf,
}

impl ChainHome {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.exists()
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    pub fn genesis_path(&self) -> PathBuf {
        self.config_dir().join("genesis.json")
    }

    pub fn gentx_dir(&self) -> PathBuf {
        self.config_dir().join("gentx")
    }

    pub fn node_config_path(&self) -> PathBuf {
        self.config_dir().join("config.toml")
    }

    /// Deletes the whole home directory. A missing home is not an error.
    pub fn remove(&self) -> io::Result<()> {
        match fs::remove_dir_all(&self.root) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            result => result,
        }
    }

    pub fn remove_genesis(&self) -> io::Result<()> {
        match fs::remove_file(self.genesis_path()) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            result => result,
        }
    }

    pub fn write_genesis(&self, genesis: &[u8]) -> io::Result<()> {
        fs::create_dir_all(self.config_dir())?;
        fs::write(self.genesis_path(), genesis)
    }

    /// Replaces the gentx staging directory with one `gentx<i>.json` per entry.
    pub fn write_gentxs<I, B>(&self, gentxs: I) -> io::Result<Vec<PathBuf>>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let dir = self.gentx_dir();
        match fs::remove_dir_all(&dir) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => return Err(err),
            _ => {}
        }
        fs::create_dir_all(&dir)?;

        gentxs
            .into_iter()
            .enumerate()
            .map(|(i, gentx)| {
                let path = dir.join(format!("gentx{i}.json"));
                fs::write(&path, gentx.as_ref())?;
                Ok(path)
            })
            .collect()
    }

    /// Sets `genesis_time` and `chain_id` at the top level of the genesis.
    pub fn update_genesis(
        &self,
        time: &DateTime<Utc>,
        chain_id: Option<&str>,
    ) -> Result<(), ChainError> {
        let path = self.genesis_path();
        let mut genesis: Map<String, Value> = match serde_json::from_slice::<Value>(&fs::read(&path)?)? {
            Value::Object(genesis) => genesis,
            other => {
                return Err(ChainError::InvalidGenesis(format!(
                    "expected an object at the top level, found {other}"
                )))
            }
        };

        genesis.insert("genesis_time".to_string(), Value::String(genesis_time(time)));
        if let Some(chain_id) = chain_id {
            genesis.insert("chain_id".to_string(), Value::String(chain_id.to_string()));
        }

        fs::write(&path, serde_json::to_vec_pretty(&genesis)?)?;
        Ok(())
    }

    /// Rewrites `p2p.persistent_peers` in the node configuration, keeping the rest intact.
    pub fn set_persistent_peers(&self, peers: &str) -> Result<(), ChainError> {
        let path = self.node_config_path();
        let mut config: Document = fs::read_to_string(&path)?.parse()?;

        if !config.contains_key("p2p") {
            config.insert("p2p", toml_edit::table());
        }
        let p2p = config
            .get_mut("p2p")
            .and_then(|p2p| p2p.as_table_like_mut())
            .ok_or_else(|| {
                ChainError::InvalidGenesis(format!("{}: `p2p` is not a table", path.display()))
            })?;
        p2p.insert("persistent_peers", value(peers));

        fs::write(&path, config.to_string())?;
        Ok(())
    }
}

/// Home directory of a launch under `base/homes`; distinct launches never share one.
pub fn home_for_launch(base: &Path, launch_key: &str) -> PathBuf {
    base.join("homes").join(launch_key)
}
