//! The chain binary as seen by the pipeline.
//!
//! [`ChainRuntime`] is the narrow set of operations the pipeline needs from a
//! chain daemon. [`ProcessRuntime`] drives a real binary through
//! subprocesses; tests substitute an in-memory implementation.

use std::{io, path::Path};

use async_trait::async_trait;
use launchpad_common::Coins;
use thiserror::Error;

pub mod command;
pub mod process;

pub use command::CommandExt;
pub use process::{ProcessOptions, ProcessRuntime};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("unexpected output from `{command}`: {output:?}")]
    UnexpectedOutput { command: String, output: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Operations a chain daemon exposes to the launch pipeline.
///
/// Every call blocks until the underlying step has completed and is bound to
/// the home directory returned by [`ChainRuntime::home`].
#[async_trait]
pub trait ChainRuntime: Send + Sync {
    /// Node home directory the runtime operates on.
    fn home(&self) -> &Path;

    /// Builds the chain binary and returns its hash.
    async fn build(&self) -> Result<String, RuntimeError>;

    /// Hash of the currently installed binary, if any.
    async fn binary_hash(&self) -> Result<Option<String>, RuntimeError>;

    /// Initializes the home directory. `fresh` overwrites any existing
    /// validator key and genesis.
    async fn init_chain(&self, fresh: bool) -> Result<(), RuntimeError>;

    async fn validate_genesis(&self) -> Result<(), RuntimeError>;

    async fn add_genesis_account(&self, address: &str, coins: &Coins) -> Result<(), RuntimeError>;

    async fn add_vesting_account(
        &self,
        address: &str,
        total_balance: &Coins,
        vesting: &Coins,
        end_time: i64,
    ) -> Result<(), RuntimeError>;

    /// Folds the gentxs staged under `config/gentx` into the genesis.
    async fn collect_gentxs(&self) -> Result<(), RuntimeError>;

    async fn show_node_id(&self) -> Result<String, RuntimeError>;

    /// Bech32 prefix the chain uses for account addresses.
    async fn detect_address_prefix(&self) -> Result<String, RuntimeError>;

    /// Drops all block and state data, keeping keys and configuration.
    async fn unsafe_reset(&self) -> Result<(), RuntimeError>;
}
