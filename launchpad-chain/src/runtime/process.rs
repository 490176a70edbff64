use std::path::{Path, PathBuf};

use async_trait::async_trait;
use launchpad_common::{address::address_prefix, crypto::digest, Coins};
use tokio::process::Command;
use tracing::{debug, info};

use super::{ChainRuntime, CommandExt, RuntimeError};

/// Account bytes fed to `debug addr` to learn the chain's address prefix.
const ZERO_ADDRESS_HEX: &str = "0000000000000000000000000000000000000000";

#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Checked-out source tree of the chain.
    pub source_dir: PathBuf,
    /// Name of the daemon, also the `cmd/<name>` package to build.
    pub binary_name: String,
    /// Where the built binary is installed.
    pub binary_path: PathBuf,
    pub home: PathBuf,
    pub chain_id: String,
    pub moniker: String,
}

/// [`ChainRuntime`] backed by a Cosmos-SDK style daemon run as subprocesses.
#[derive(Debug, Clone)]
pub struct ProcessRuntime {
    options: ProcessOptions,
    go: PathBuf,
}

impl ProcessRuntime {
    pub fn new(options: ProcessOptions) -> Self {
        Self {
            options,
            go: PathBuf::from("go"),
        }
    }

    /// Uses a specific `go` toolchain instead of the one on `PATH`.
    pub fn with_go(mut self, go: impl Into<PathBuf>) -> Self {
        self.go = go.into();
        self
    }

    pub fn binary_path(&self) -> &Path {
        &self.options.binary_path
    }

    fn daemon(&self) -> Command {
        Command::new(&self.options.binary_path)
    }

    /// A daemon command bound to the chain home.
    fn daemon_at_home<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut command = self.daemon();
        command.args(args).arg("--home").arg(&self.options.home);
        command
    }
}

#[async_trait]
impl ChainRuntime for ProcessRuntime {
    fn home(&self) -> &Path {
        &self.options.home
    }

    async fn build(&self) -> Result<String, RuntimeError> {
        info!(
            "🔨 Building {} from {}",
            self.options.binary_name,
            self.options.source_dir.display()
        );
        if let Some(parent) = self.options.binary_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        Command::new(&self.go)
            .current_dir(&self.options.source_dir)
            .arg("build")
            .arg("-mod=readonly")
            .arg("-o")
            .arg(&self.options.binary_path)
            .arg(format!("./cmd/{}", self.options.binary_name))
            .spawn_and_wait()
            .await?;

        let binary = tokio::fs::read(&self.options.binary_path).await?;
        Ok(digest(&binary))
    }

    async fn binary_hash(&self) -> Result<Option<String>, RuntimeError> {
        match tokio::fs::read(&self.options.binary_path).await {
            Ok(binary) => Ok(Some(digest(&binary))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn init_chain(&self, fresh: bool) -> Result<(), RuntimeError> {
        let mut command = self.daemon_at_home([
            "init",
            self.options.moniker.as_str(),
            "--chain-id",
            self.options.chain_id.as_str(),
        ]);
        if fresh {
            command.arg("--overwrite");
        }
        command.spawn_and_wait().await
    }

    async fn validate_genesis(&self) -> Result<(), RuntimeError> {
        self.daemon_at_home(["validate-genesis"])
            .spawn_and_wait()
            .await
    }

    async fn add_genesis_account(&self, address: &str, coins: &Coins) -> Result<(), RuntimeError> {
        let coins = coins.to_string();
        self.daemon_at_home(["add-genesis-account", address, coins.as_str()])
            .spawn_and_wait()
            .await
    }

    async fn add_vesting_account(
        &self,
        address: &str,
        total_balance: &Coins,
        vesting: &Coins,
        end_time: i64,
    ) -> Result<(), RuntimeError> {
        self.daemon_at_home([
            "add-genesis-account".to_string(),
            address.to_string(),
            total_balance.to_string(),
            "--vesting-amount".to_string(),
            vesting.to_string(),
            "--vesting-end-time".to_string(),
            end_time.to_string(),
        ])
        .spawn_and_wait()
        .await
    }

    async fn collect_gentxs(&self) -> Result<(), RuntimeError> {
        self.daemon_at_home(["collect-gentxs"])
            .spawn_and_wait()
            .await
    }

    async fn show_node_id(&self) -> Result<String, RuntimeError> {
        let mut command = self.daemon_at_home(["tendermint", "show-node-id"]);
        let output = command.spawn_and_wait_for_stdout().await?;
        let node_id = output.trim();
        if node_id.is_empty() {
            return Err(RuntimeError::UnexpectedOutput {
                command: command.description(),
                output,
            });
        }
        Ok(node_id.to_string())
    }

    async fn detect_address_prefix(&self) -> Result<String, RuntimeError> {
        let mut command = self.daemon();
        command.args(["debug", "addr", ZERO_ADDRESS_HEX]);
        let output = command.spawn_and_wait_for_stdout().await?;
        let prefix = parse_account_prefix(&output).ok_or_else(|| RuntimeError::UnexpectedOutput {
            command: command.description(),
            output: output.clone(),
        })?;
        debug!(%prefix, "detected address prefix");
        Ok(prefix)
    }

    async fn unsafe_reset(&self) -> Result<(), RuntimeError> {
        self.daemon_at_home(["tendermint", "unsafe-reset-all"])
            .spawn_and_wait()
            .await
    }
}

/// Extracts the human-readable part of the `Bech32 Acc:` line printed by `debug addr`.
fn parse_account_prefix(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix("Bech32 Acc:"))
        .and_then(|address| address_prefix(address.trim()).ok())
}
