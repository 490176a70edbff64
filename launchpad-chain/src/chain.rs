//! The launch pipeline: turns a source checkout and a genesis data set into a
//! node home that is ready to boot.
//!
//! ```text
//! Uninitialized --init--> Initialized --prepare--> GenesisPrepared
//!       |                      ^
//!       +--build--> Built -----+ (prepare)
//! ```
//!
//! Every external failure is wrapped in [`ChainError::Phase`] naming the step
//! that failed. No step is retried.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use launchpad_common::{address::change_address_prefix, peer::join_peers, Peer};
use launchpad_genesis::GenesisInformation;
use tracing::{debug, info, warn};

use crate::{
    cache::BinaryCache,
    error::{ChainError, Phase, PhaseExt},
    fetch::{genesis_and_hash, GenesisFetcher},
    home::ChainHome,
    runtime::ChainRuntime,
    source::FetchedSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    Uninitialized,
    Built,
    Initialized,
    GenesisPrepared,
}

/// Launch parameters of a chain.
#[derive(Debug, Clone)]
pub struct ChainOptions {
    pub launch_id: Option<u64>,
    pub chain_id: String,
    /// Published genesis to start from instead of the default one.
    pub genesis_url: Option<String>,
    /// Expected SHA-256 of the published genesis. Pinned on first fetch when unset.
    pub genesis_hash: Option<String>,
    pub launch_time: DateTime<Utc>,
}

pub struct Chain<R> {
    runtime: R,
    fetcher: Arc<dyn GenesisFetcher>,
    cache: Option<BinaryCache>,
    source: FetchedSource,
    home: ChainHome,
    options: ChainOptions,
    state: ChainState,
}

impl<R: ChainRuntime> Chain<R> {
    /// A chain whose home is the runtime's home. An existing home counts as initialized.
    pub fn new(
        source: FetchedSource,
        options: ChainOptions,
        runtime: R,
        fetcher: Arc<dyn GenesisFetcher>,
    ) -> Self {
        let home = ChainHome::new(runtime.home());
        let state = if home.exists() {
            ChainState::Initialized
        } else {
            ChainState::Uninitialized
        };
        Self {
            runtime,
            fetcher,
            cache: None,
            source,
            home,
            options,
            state,
        }
    }

    pub fn with_binary_cache(mut self, cache: BinaryCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        matches!(
            self.state,
            ChainState::Initialized | ChainState::GenesisPrepared
        )
    }

    pub fn home(&self) -> &ChainHome {
        &self.home
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn source(&self) -> &FetchedSource {
        &self.source
    }

    pub fn options(&self) -> &ChainOptions {
        &self.options
    }

    /// Hash the published genesis is pinned to, if any.
    pub fn genesis_hash(&self) -> Option<&str> {
        self.options.genesis_hash.as_deref()
    }

    /// Builds the chain binary and returns its hash.
    ///
    /// With a launch id and a binary cache, a binary already built from the
    /// same source is reused.
    pub async fn build(&mut self) -> Result<String, ChainError> {
        if let Some(binary_hash) = self.cached_binary().await? {
            info!("✅ Binary already built for this launch, skipping build");
            self.mark_built();
            return Ok(binary_hash);
        }

        info!("🔨 Building the chain binary");
        let binary_hash = self.runtime.build().await.phase(Phase::Build)?;

        if let (Some(launch_id), Some(cache)) = (self.options.launch_id, &self.cache) {
            cache
                .cache_binary_for_launch_id(launch_id, &binary_hash, &self.source.hash)
                .phase(Phase::CacheBinary)?;
        }

        self.mark_built();
        Ok(binary_hash)
    }

    async fn cached_binary(&self) -> Result<Option<String>, ChainError> {
        let (Some(launch_id), Some(cache)) = (self.options.launch_id, &self.cache) else {
            return Ok(None);
        };
        let Some(binary_hash) = self.runtime.binary_hash().await.phase(Phase::Build)? else {
            return Ok(None);
        };
        let hit = cache
            .check_binary_cache_for_launch_id(launch_id, &binary_hash, &self.source.hash)
            .phase(Phase::CacheBinary)?;
        Ok(hit.then_some(binary_hash))
    }

    fn mark_built(&mut self) {
        if self.state == ChainState::Uninitialized {
            self.state = ChainState::Built;
        }
    }

    /// Recreates the home from scratch: build, fresh init, genesis, validation.
    ///
    /// Destroys any existing home. A published genesis is fetched and checked
    /// against the pinned hash before anything is deleted.
    pub async fn init(&mut self) -> Result<(), ChainError> {
        let genesis = self.fetch_genesis().await?;

        info!("🧹 Removing {}", self.home.root().display());
        self.home.remove().phase(Phase::RemoveHome)?;
        self.state = ChainState::Uninitialized;

        self.build().await?;

        info!("🪪 Initializing the chain with a fresh validator key");
        self.runtime.init_chain(true).await.phase(Phase::InitChain)?;

        self.install_genesis(genesis).await
    }

    /// Regenerates only the genesis of an existing home, keeping its keys.
    async fn init_genesis(&mut self) -> Result<(), ChainError> {
        let genesis = self.fetch_genesis().await?;

        self.home.remove_genesis().phase(Phase::WriteGenesis)?;
        if genesis.is_none() {
            self.runtime
                .init_chain(false)
                .await
                .phase(Phase::InitChain)?;
        }

        self.install_genesis(genesis).await
    }

    /// Fetches the published genesis, if any, and checks it against the pinned hash.
    async fn fetch_genesis(&self) -> Result<Option<(Vec<u8>, String)>, ChainError> {
        let Some(url) = self.options.genesis_url.as_deref() else {
            return Ok(None);
        };

        info!("🌐 Fetching genesis from {url}");
        let (genesis, hash) = genesis_and_hash(self.fetcher.as_ref(), url)
            .await
            .phase(Phase::FetchGenesis)?;

        if let Some(expected) = self.genesis_hash() {
            if expected != hash {
                return Err(ChainError::GenesisHashMismatch {
                    url: url.to_string(),
                    expected: expected.to_string(),
                    actual: hash,
                })
                .phase(Phase::FetchGenesis);
            }
        }
        serde_json::from_slice::<serde_json::Value>(&genesis).phase(Phase::FetchGenesis)?;

        Ok(Some((genesis, hash)))
    }

    /// Writes a fetched genesis over the default one, validates, and pins its hash.
    async fn install_genesis(
        &mut self,
        genesis: Option<(Vec<u8>, String)>,
    ) -> Result<(), ChainError> {
        let pinned = match genesis {
            Some((genesis, hash)) => {
                self.home.write_genesis(&genesis).phase(Phase::WriteGenesis)?;
                Some(hash)
            }
            None => None,
        };

        self.runtime
            .validate_genesis()
            .await
            .phase(Phase::ValidateGenesis)?;

        if let Some(hash) = pinned {
            if self.options.genesis_hash.is_none() {
                debug!(%hash, "pinning genesis hash");
            }
            self.options.genesis_hash = Some(hash);
        }
        self.state = ChainState::Initialized;
        Ok(())
    }

    /// Brings the home to a bootable state for `genesis_information`.
    ///
    /// A missing home is initialized from scratch; an existing one is rebuilt
    /// and gets a regenerated genesis, keeping its validator key.
    pub async fn prepare(&mut self, genesis_information: &GenesisInformation) -> Result<(), ChainError> {
        if self.home.exists() {
            self.build().await?;
            self.init_genesis().await?;
        } else {
            self.init().await?;
        }

        self.build_genesis(genesis_information).await?;

        self.runtime
            .validate_genesis()
            .await
            .phase(Phase::ValidateGenesis)?;
        // The node may have been started on a previous genesis.
        self.runtime.unsafe_reset().await.phase(Phase::UnsafeReset)?;

        self.state = ChainState::GenesisPrepared;
        info!("🚀 Chain {} is ready", self.options.chain_id);
        Ok(())
    }

    /// Writes accounts, vesting accounts and validators into the genesis and
    /// sets its launch time.
    ///
    /// The gentx directory and `persistent_peers` always end up matching the
    /// validator set, so an empty set empties both.
    pub async fn build_genesis(
        &mut self,
        genesis_information: &GenesisInformation,
    ) -> Result<(), ChainError> {
        let prefix = self
            .runtime
            .detect_address_prefix()
            .await
            .phase(Phase::DetectPrefix)?;

        let accounts = genesis_information.genesis_accounts();
        info!("💰 Adding {} genesis accounts", accounts.len());
        async {
            for account in &accounts {
                let address = change_address_prefix(&account.address, &prefix)?;
                self.runtime
                    .add_genesis_account(&address, &account.coins)
                    .await?;
            }
            Ok::<_, ChainError>(())
        }
        .await
        .phase(Phase::ApplyAccounts)?;

        let vesting_accounts = genesis_information.vesting_accounts();
        info!("⏳ Adding {} vesting accounts", vesting_accounts.len());
        async {
            for account in &vesting_accounts {
                let address = change_address_prefix(&account.address, &prefix)?;
                self.runtime
                    .add_vesting_account(
                        &address,
                        &account.total_balance,
                        &account.vesting,
                        account.end_time,
                    )
                    .await?;
            }
            Ok::<_, ChainError>(())
        }
        .await
        .phase(Phase::ApplyVestingAccounts)?;

        let validators = genesis_information.genesis_validators();
        if validators.is_empty() {
            // Nothing to collect, but a previous preparation's gentxs and peers must not linger.
            warn!("No genesis validators, clearing gentxs and persistent peers");
            self.home
                .write_gentxs(Vec::<Vec<u8>>::new())
                .phase(Phase::ApplyValidators)?;
            self.home
                .set_persistent_peers("")
                .phase(Phase::UpdatePeers)?;
        } else {
            info!("🛡️ Collecting {} gentxs", validators.len());
            self.home
                .write_gentxs(validators.iter().map(|validator| &validator.gen_tx))
                .phase(Phase::ApplyValidators)?;
            self.runtime
                .collect_gentxs()
                .await
                .phase(Phase::ApplyValidators)?;

            let peers = join_peers(validators.iter().map(|validator| &validator.peer));
            self.home
                .set_persistent_peers(&peers)
                .phase(Phase::UpdatePeers)?;
        }

        self.home
            .update_genesis(&self.options.launch_time, Some(&self.options.chain_id))
            .phase(Phase::SetGenesisTime)?;
        Ok(())
    }

    /// Puts the genesis time back to the Unix epoch.
    pub async fn reset_genesis_time(&self) -> Result<(), ChainError> {
        self.home
            .update_genesis(&DateTime::<Utc>::default(), None)
            .phase(Phase::SetGenesisTime)
    }

    /// The `<node-id>@<public_address>` other validators dial to reach this node.
    pub async fn peer_address(&self, public_address: &str) -> Result<Peer, ChainError> {
        let node_id = self
            .runtime
            .show_node_id()
            .await
            .phase(Phase::ShowNodeId)?;
        Ok(Peer::new(node_id, public_address)?)
    }
}
