use launchpad_common::{utils::encoding::base64_bytes, Coin, Coins};
use serde::{Deserialize, Serialize};

/// A plain balance granted at genesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub address: String,
    pub coins: Coins,
}

/// A delayed-vesting grant: `vesting` unlocks at once at `end_time` (Unix seconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingAccount {
    pub address: String,
    pub total_balance: Coins,
    pub vesting: Coins,
    pub end_time: i64,
}

/// One intended validator and its signed genesis transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisValidator {
    pub address: String,
    #[serde(with = "base64_bytes")]
    pub gen_tx: Vec<u8>,
    pub peer: String,
    pub self_delegation: Coin,
}
