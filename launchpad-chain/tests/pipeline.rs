use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use launchpad_chain::{
    simulate_requests, BinaryCache, Chain, ChainError, ChainOptions, ChainRuntime, ChainState,
    FetchError, FetchedSource, GenesisFetcher, Phase, RuntimeError,
};
use launchpad_common::{address::address_from_bytes, crypto::digest, Coins};
use launchpad_genesis::{
    GenesisAccount, GenesisError, GenesisInformation, GenesisValidator, GenesisValidatorRequest,
    Request, RequestContent, VestingAccount, COORDINATOR_PREFIX,
};
use serde_json::Value;

const BINARY_HASH: &str = "b1a2c3";
const NODE_ID: &str = "7f3e9a0c";

#[derive(Default)]
struct RuntimeLog {
    calls: Vec<String>,
    builds: usize,
    installed: Option<String>,
    collected_gentxs: Vec<Vec<u8>>,
}

/// Records every call and lays out the home like a real daemon would.
#[derive(Clone)]
struct MockRuntime {
    home: PathBuf,
    fail_on: Option<&'static str>,
    log: Arc<Mutex<RuntimeLog>>,
}

impl MockRuntime {
    fn new(home: PathBuf) -> Self {
        Self {
            home,
            fail_on: None,
            log: Arc::default(),
        }
    }

    fn failing_on(mut self, call: &'static str) -> Self {
        self.fail_on = Some(call);
        self
    }

    fn record(&self, call: String) -> Result<(), RuntimeError> {
        let name = call.split_whitespace().next().unwrap_or_default().to_string();
        self.log.lock().unwrap().calls.push(call);
        if self.fail_on == Some(name.as_str()) {
            return Err(RuntimeError::Failed {
                command: name,
                status: "exit status: 1".to_string(),
                stderr: "mock failure".to_string(),
            });
        }
        Ok(())
    }

    fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().calls.clone()
    }

    fn call_names(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|call| call.split_whitespace().next().unwrap().to_string())
            .collect()
    }

    fn builds(&self) -> usize {
        self.log.lock().unwrap().builds
    }

    fn config_dir(&self) -> PathBuf {
        self.home.join("config")
    }
}

#[async_trait]
impl ChainRuntime for MockRuntime {
    fn home(&self) -> &Path {
        &self.home
    }

    async fn build(&self) -> Result<String, RuntimeError> {
        self.record("build".to_string())?;
        let mut log = self.log.lock().unwrap();
        log.builds += 1;
        log.installed = Some(BINARY_HASH.to_string());
        Ok(BINARY_HASH.to_string())
    }

    async fn binary_hash(&self) -> Result<Option<String>, RuntimeError> {
        Ok(self.log.lock().unwrap().installed.clone())
    }

    async fn init_chain(&self, fresh: bool) -> Result<(), RuntimeError> {
        self.record(format!("init-chain {fresh}"))?;
        let config = self.config_dir();
        fs::create_dir_all(&config)?;
        fs::write(
            config.join("genesis.json"),
            r#"{"genesis_time":"2019-01-01T00:00:00Z","chain_id":"","app_state":{}}"#,
        )?;
        if fresh || !config.join("config.toml").exists() {
            fs::write(
                config.join("config.toml"),
                "moniker = \"launchpad\"\n\n[p2p]\npersistent_peers = \"\"\n",
            )?;
            fs::write(config.join("node_key.json"), NODE_ID)?;
        }
        Ok(())
    }

    async fn validate_genesis(&self) -> Result<(), RuntimeError> {
        self.record("validate-genesis".to_string())?;
        let genesis = fs::read(self.config_dir().join("genesis.json"))?;
        serde_json::from_slice::<Value>(&genesis).map_err(|err| RuntimeError::UnexpectedOutput {
            command: "validate-genesis".to_string(),
            output: err.to_string(),
        })?;
        Ok(())
    }

    async fn add_genesis_account(&self, address: &str, coins: &Coins) -> Result<(), RuntimeError> {
        self.record(format!("add-genesis-account {address} {coins}"))
    }

    async fn add_vesting_account(
        &self,
        address: &str,
        total_balance: &Coins,
        vesting: &Coins,
        end_time: i64,
    ) -> Result<(), RuntimeError> {
        self.record(format!(
            "add-vesting-account {address} {total_balance} {vesting} {end_time}"
        ))
    }

    async fn collect_gentxs(&self) -> Result<(), RuntimeError> {
        let dir = self.config_dir().join("gentx");
        let mut names: Vec<_> = fs::read_dir(&dir)?
            .map(|entry| entry.map(|entry| entry.file_name()))
            .collect::<Result<_, _>>()?;
        names.sort();
        self.record(format!("collect-gentxs {}", names.len()))?;

        let mut log = self.log.lock().unwrap();
        for name in names {
            log.collected_gentxs.push(fs::read(dir.join(name))?);
        }
        Ok(())
    }

    async fn show_node_id(&self) -> Result<String, RuntimeError> {
        self.record("show-node-id".to_string())?;
        Ok(NODE_ID.to_string())
    }

    async fn detect_address_prefix(&self) -> Result<String, RuntimeError> {
        self.record("detect-address-prefix".to_string())?;
        Ok("cosmos".to_string())
    }

    async fn unsafe_reset(&self) -> Result<(), RuntimeError> {
        self.record("unsafe-reset".to_string())
    }
}

struct MockFetcher {
    genesis: Vec<u8>,
    fetches: AtomicUsize,
}

impl MockFetcher {
    fn serving(genesis: &str) -> Arc<Self> {
        Arc::new(Self {
            genesis: genesis.as_bytes().to_vec(),
            fetches: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl GenesisFetcher for MockFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.genesis.clone())
    }
}

const PUBLISHED_GENESIS: &str = r#"{"genesis_time":"2021-06-01T00:00:00Z","chain_id":"orbit-1","app_state":{"bank":{"balances":[]}}}"#;

struct Fixture {
    _dir: tempfile::TempDir,
    home: PathBuf,
    runtime: MockRuntime,
    fetcher: Arc<MockFetcher>,
    options: ChainOptions,
    source: FetchedSource,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("home");
        Self {
            runtime: MockRuntime::new(home.clone()),
            fetcher: MockFetcher::serving(PUBLISHED_GENESIS),
            options: ChainOptions {
                launch_id: None,
                chain_id: "orbit-1".to_string(),
                genesis_url: None,
                genesis_hash: None,
                launch_time: Utc.with_ymd_and_hms(2023, 5, 17, 12, 0, 0).unwrap(),
            },
            source: FetchedSource {
                path: dir.path().join("src"),
                hash: "5ca1ab1e".to_string(),
            },
            home,
            _dir: dir,
        }
    }

    fn chain(&self) -> Chain<MockRuntime> {
        Chain::new(
            self.source.clone(),
            self.options.clone(),
            self.runtime.clone(),
            self.fetcher.clone(),
        )
    }

    fn genesis(&self) -> Value {
        serde_json::from_slice(&fs::read(self.home.join("config/genesis.json")).unwrap()).unwrap()
    }
}

fn coordinator_address(byte: u8) -> String {
    address_from_bytes(&[byte; 20], "spn").unwrap()
}

fn genesis_information() -> GenesisInformation {
    GenesisInformation::new(
        vec![
            GenesisAccount {
                address: coordinator_address(2),
                coins: "100stake".parse().unwrap(),
            },
            GenesisAccount {
                address: coordinator_address(1),
                coins: "5token,20stake".parse().unwrap(),
            },
        ],
        vec![VestingAccount {
            address: coordinator_address(3),
            total_balance: "1000stake".parse().unwrap(),
            vesting: "400stake".parse().unwrap(),
            end_time: 1_700_000_000,
        }],
        vec![
            GenesisValidator {
                address: coordinator_address(9),
                gen_tx: br#"{"validator":9}"#.to_vec(),
                peer: "nine@10.0.0.9:26656".to_string(),
                self_delegation: "10stake".parse().unwrap(),
            },
            GenesisValidator {
                address: coordinator_address(4),
                gen_tx: br#"{"validator":4}"#.to_vec(),
                peer: "four@10.0.0.4:26656".to_string(),
                self_delegation: "10stake".parse().unwrap(),
            },
        ],
    )
}

#[tokio::test]
async fn test_init_fresh_home() {
    let fixture = Fixture::new();
    let mut chain = fixture.chain();
    assert_eq!(chain.state(), ChainState::Uninitialized);

    chain.init().await.unwrap();

    assert_eq!(chain.state(), ChainState::Initialized);
    assert_eq!(
        fixture.runtime.call_names(),
        ["build", "init-chain", "validate-genesis"]
    );
    assert_eq!(fixture.runtime.calls()[1], "init-chain true");
    assert_eq!(chain.genesis_hash(), None);
}

#[tokio::test]
async fn test_init_wipes_existing_home() {
    let fixture = Fixture::new();
    fs::create_dir_all(&fixture.home).unwrap();
    fs::write(fixture.home.join("leftover"), b"old").unwrap();

    let mut chain = fixture.chain();
    assert!(chain.is_initialized());
    chain.init().await.unwrap();

    assert!(!fixture.home.join("leftover").exists());
    assert!(fixture.home.join("config/genesis.json").exists());
}

#[tokio::test]
async fn test_init_pins_published_genesis() {
    let mut fixture = Fixture::new();
    fixture.options.genesis_url = Some("https://example.com/genesis.json".to_string());
    let mut chain = fixture.chain();

    chain.init().await.unwrap();

    let expected = digest(PUBLISHED_GENESIS.as_bytes());
    assert_eq!(chain.genesis_hash(), Some(expected.as_str()));
    assert_eq!(
        fs::read_to_string(fixture.home.join("config/genesis.json")).unwrap(),
        PUBLISHED_GENESIS
    );
    assert_eq!(fixture.fetcher.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_genesis_hash_mismatch_aborts_before_touching_home() {
    let mut fixture = Fixture::new();
    fixture.options.genesis_url = Some("https://example.com/genesis.json".to_string());
    fixture.options.genesis_hash = Some(digest(b"some other genesis"));

    fs::create_dir_all(fixture.home.join("config")).unwrap();
    fs::write(fixture.home.join("config/genesis.json"), b"{\"kept\":true}").unwrap();

    let mut chain = fixture.chain();
    let err = chain.init().await.unwrap_err();

    assert_eq!(err.phase(), Some(Phase::FetchGenesis));
    assert!(matches!(err.root(), ChainError::GenesisHashMismatch { .. }));
    assert!(fixture.runtime.calls().is_empty());
    assert_eq!(
        fs::read(fixture.home.join("config/genesis.json")).unwrap(),
        b"{\"kept\":true}"
    );
    assert_eq!(chain.state(), ChainState::Initialized);
}

#[tokio::test]
async fn test_init_failure_is_not_promoted() {
    let fixture = Fixture::new();
    let runtime = fixture.runtime.clone().failing_on("init-chain");
    let mut chain = Chain::new(
        fixture.source.clone(),
        fixture.options.clone(),
        runtime,
        fixture.fetcher.clone(),
    );

    let err = chain.init().await.unwrap_err();
    assert_eq!(err.phase(), Some(Phase::InitChain));
    assert_eq!(chain.state(), ChainState::Built);
    assert!(!chain.is_initialized());
}

#[tokio::test]
async fn test_prepare_new_home() {
    let fixture = Fixture::new();
    let mut chain = fixture.chain();
    let gi = genesis_information();

    chain.prepare(&gi).await.unwrap();
    assert_eq!(chain.state(), ChainState::GenesisPrepared);

    // Accounts and validators are processed in coordinator address order.
    let mut expected_accounts = vec![
        (coordinator_address(1), address_from_bytes(&[1; 20], "cosmos").unwrap(), "20stake,5token"),
        (coordinator_address(2), address_from_bytes(&[2; 20], "cosmos").unwrap(), "100stake"),
    ];
    expected_accounts.sort();
    let expected_accounts: Vec<_> = expected_accounts
        .into_iter()
        .map(|(_, address, coins)| format!("add-genesis-account {address} {coins}"))
        .collect();

    let calls = fixture.runtime.calls();
    let accounts: Vec<_> = calls
        .iter()
        .filter(|call| call.starts_with("add-genesis-account"))
        .cloned()
        .collect();
    assert_eq!(accounts, expected_accounts);
    assert!(calls.contains(&format!(
        "add-vesting-account {} 1000stake 400stake 1700000000",
        address_from_bytes(&[3; 20], "cosmos").unwrap()
    )));
    assert!(calls.contains(&"collect-gentxs 2".to_string()));

    let mut expected_validators = vec![
        (coordinator_address(4), br#"{"validator":4}"#.to_vec(), "four@10.0.0.4:26656"),
        (coordinator_address(9), br#"{"validator":9}"#.to_vec(), "nine@10.0.0.9:26656"),
    ];
    expected_validators.sort();
    let expected_gentxs: Vec<_> = expected_validators.iter().map(|(_, gentx, _)| gentx.clone()).collect();
    let expected_peers: Vec<_> = expected_validators.iter().map(|(_, _, peer)| *peer).collect();

    let collected = fixture.runtime.log.lock().unwrap().collected_gentxs.clone();
    assert_eq!(collected, expected_gentxs);
    let config = fs::read_to_string(fixture.home.join("config/config.toml")).unwrap();
    assert!(
        config.contains(&format!("persistent_peers = \"{}\"", expected_peers.join(","))),
        "{config}"
    );

    let genesis = fixture.genesis();
    assert_eq!(genesis["genesis_time"], "2023-05-17T12:00:00Z");
    assert_eq!(genesis["chain_id"], "orbit-1");

    let names = fixture.runtime.call_names();
    assert_eq!(names.last().map(String::as_str), Some("unsafe-reset"));
    assert_eq!(names[names.len() - 2], "validate-genesis");
}

#[tokio::test]
async fn test_prepare_existing_home_keeps_keys() {
    let fixture = Fixture::new();
    fixture.chain().init().await.unwrap();
    fs::write(fixture.home.join("config/node_key.json"), b"kept-key").unwrap();

    let mut chain = fixture.chain();
    chain.prepare(&GenesisInformation::default()).await.unwrap();

    assert_eq!(
        fs::read(fixture.home.join("config/node_key.json")).unwrap(),
        b"kept-key"
    );
    let calls = fixture.runtime.calls();
    assert_eq!(calls.iter().filter(|call| *call == "init-chain false").count(), 1);
    assert!(!calls.iter().any(|call| call.starts_with("collect-gentxs")));
    assert_eq!(chain.state(), ChainState::GenesisPrepared);
}

#[tokio::test]
async fn test_prepare_without_validators_clears_previous_ones() {
    let fixture = Fixture::new();
    fixture.chain().prepare(&genesis_information()).await.unwrap();
    let gentx_dir = fixture.home.join("config/gentx");
    assert_eq!(fs::read_dir(&gentx_dir).unwrap().count(), 2);

    let mut chain = fixture.chain();
    chain.prepare(&GenesisInformation::default()).await.unwrap();

    assert_eq!(fs::read_dir(&gentx_dir).unwrap().count(), 0);
    let config = fs::read_to_string(fixture.home.join("config/config.toml")).unwrap();
    assert!(config.contains("persistent_peers = \"\""), "{config}");
    assert!(!config.contains("nine@10.0.0.9:26656"), "{config}");
    assert_eq!(chain.state(), ChainState::GenesisPrepared);
}

#[tokio::test]
async fn test_prepare_existing_home_refreshes_published_genesis() {
    let mut fixture = Fixture::new();
    fixture.options.genesis_url = Some("https://example.com/genesis.json".to_string());
    fixture.chain().init().await.unwrap();
    fs::write(fixture.home.join("config/genesis.json"), b"{\"stale\":true}").unwrap();

    let mut chain = fixture.chain();
    chain.prepare(&GenesisInformation::default()).await.unwrap();

    let genesis = fixture.genesis();
    assert!(genesis.get("stale").is_none());
    assert!(genesis["app_state"]["bank"].is_object());
    assert_eq!(genesis["genesis_time"], "2023-05-17T12:00:00Z");
}

#[tokio::test]
async fn test_failures_name_their_phase() {
    let cases = [
        ("detect-address-prefix", Phase::DetectPrefix, "detecting the address prefix"),
        ("add-genesis-account", Phase::ApplyAccounts, "applying genesis accounts"),
        ("add-vesting-account", Phase::ApplyVestingAccounts, "applying vesting accounts"),
        ("collect-gentxs", Phase::ApplyValidators, "applying genesis validators"),
        ("unsafe-reset", Phase::UnsafeReset, "resetting the chain state"),
    ];

    for (call, phase, message) in cases {
        let fixture = Fixture::new();
        let runtime = fixture.runtime.clone().failing_on(call);
        let mut chain = Chain::new(
            fixture.source.clone(),
            fixture.options.clone(),
            runtime,
            fixture.fetcher.clone(),
        );

        let err = chain.prepare(&genesis_information()).await.unwrap_err();
        assert_eq!(err.phase(), Some(phase), "{call}");
        assert!(err.to_string().contains(message), "{err}");
        assert!(matches!(err.root(), ChainError::Runtime(_)));
        assert_ne!(chain.state(), ChainState::GenesisPrepared);
    }
}

#[tokio::test]
async fn test_invalid_account_address_fails_in_accounts_phase() {
    let fixture = Fixture::new();
    let mut chain = fixture.chain();
    chain.init().await.unwrap();

    let gi = GenesisInformation::new(
        vec![GenesisAccount {
            address: "not-an-address".to_string(),
            coins: "1stake".parse().unwrap(),
        }],
        vec![],
        vec![],
    );
    let err = chain.build_genesis(&gi).await.unwrap_err();
    assert_eq!(err.phase(), Some(Phase::ApplyAccounts));
    assert!(matches!(err.root(), ChainError::Address(_)));
}

#[tokio::test]
async fn test_build_reuses_cached_binary() {
    let mut fixture = Fixture::new();
    fixture.options.launch_id = Some(7);
    let cache = BinaryCache::in_dir(&fixture.home.parent().unwrap().join("cache"));

    let mut chain = fixture.chain().with_binary_cache(cache.clone());
    assert_eq!(chain.build().await.unwrap(), BINARY_HASH);
    assert_eq!(chain.state(), ChainState::Built);
    assert!(cache
        .check_binary_cache_for_launch_id(7, BINARY_HASH, &fixture.source.hash)
        .unwrap());

    let mut chain = fixture.chain().with_binary_cache(cache.clone());
    chain.build().await.unwrap();
    assert_eq!(fixture.runtime.builds(), 1);

    // New source, same launch: rebuild.
    fixture.source.hash = "d00dfeed".to_string();
    let mut chain = fixture.chain().with_binary_cache(cache);
    chain.build().await.unwrap();
    assert_eq!(fixture.runtime.builds(), 2);
}

#[tokio::test]
async fn test_build_without_launch_id_skips_cache() {
    let fixture = Fixture::new();
    let cache = BinaryCache::in_dir(&fixture.home.parent().unwrap().join("cache"));

    for _ in 0..2 {
        let mut chain = fixture.chain().with_binary_cache(cache.clone());
        chain.build().await.unwrap();
    }
    assert_eq!(fixture.runtime.builds(), 2);
    assert!(!cache.path().exists());
}

#[tokio::test]
async fn test_reset_genesis_time() {
    let fixture = Fixture::new();
    let mut chain = fixture.chain();
    chain.prepare(&GenesisInformation::default()).await.unwrap();

    chain.reset_genesis_time().await.unwrap();
    let genesis = fixture.genesis();
    assert_eq!(genesis["genesis_time"], "1970-01-01T00:00:00Z");
    assert_eq!(genesis["chain_id"], "orbit-1");
}

#[tokio::test]
async fn test_peer_address() {
    let fixture = Fixture::new();
    let chain = fixture.chain();

    let peer = chain.peer_address("203.0.113.5:26656").await.unwrap();
    assert_eq!(peer.to_string(), format!("{NODE_ID}@203.0.113.5:26656"));

    let err = chain.peer_address("").await.unwrap_err();
    assert!(matches!(err, ChainError::Peer(_)));
}

fn join_request(id: u64, key: u8, stake: &str) -> Request {
    let gentx = serde_json::json!({
        "body": {
            "messages": [{
                "delegator_address": address_from_bytes(&[key; 20], "cosmos").unwrap(),
                "validator_address": address_from_bytes(&[key; 20], "cosmosvaloper").unwrap(),
                "pubkey": { "key": STANDARD.encode([key; 32]) },
                "value": { "denom": "stake", "amount": "50" }
            }]
        }
    });
    Request::new(
        id,
        RequestContent::GenesisValidator(GenesisValidatorRequest {
            address: address_from_bytes(&[key; 20], COORDINATOR_PREFIX).unwrap(),
            gen_tx: serde_json::to_vec(&gentx).unwrap(),
            cons_pub_key: vec![key; 32],
            self_delegation: stake.parse().unwrap(),
            peer: format!("node{key}@10.0.0.{key}:26656"),
        }),
    )
}

#[tokio::test]
async fn test_simulate_requests() {
    let fixture = Fixture::new();
    let mut chain = fixture.chain();
    let approved = GenesisInformation::default()
        .apply_requests(&[Request::new(
            1,
            RequestContent::GenesisAccount(GenesisAccount {
                address: coordinator_address(5),
                coins: "1000stake".parse().unwrap(),
            }),
        )])
        .unwrap();

    let simulated = simulate_requests(
        &mut chain,
        approved.clone(),
        &[join_request(2, 5, "50stake")],
        COORDINATOR_PREFIX,
    )
    .await
    .unwrap();

    assert!(simulated.contains_genesis_account(&coordinator_address(5)));
    assert!(simulated.contains_genesis_validator(&coordinator_address(5)));
    assert!(!approved.contains_genesis_validator(&coordinator_address(5)));
    assert!(fixture.runtime.calls().contains(&"collect-gentxs 1".to_string()));
    assert_eq!(chain.state(), ChainState::GenesisPrepared);
}

#[tokio::test]
async fn test_simulate_rejects_before_touching_chain() {
    let fixture = Fixture::new();
    let mut chain = fixture.chain();

    let err = simulate_requests(
        &mut chain,
        GenesisInformation::default(),
        &[join_request(1, 5, "50stake"), join_request(2, 6, "3stake")],
        COORDINATOR_PREFIX,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        ChainError::Genesis(GenesisError::InvalidRequest { request_id: 2, .. })
    ));
    assert!(fixture.runtime.calls().is_empty());
    assert_eq!(chain.state(), ChainState::Uninitialized);
}
