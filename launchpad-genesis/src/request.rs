use launchpad_common::{utils::encoding::base64_bytes, Coin, Coins};
use serde::{Deserialize, Serialize};

use crate::{
    error::GenesisError,
    types::{GenesisAccount, GenesisValidator, VestingAccount},
};

/// A change to the genesis approved on the coordination chain.
///
/// `request_id` only identifies the request in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub request_id: u64,
    pub content: RequestContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestContent {
    GenesisAccount(GenesisAccount),
    VestingAccount(VestingAccountRequest),
    AccountRemoval(AccountRemoval),
    GenesisValidator(GenesisValidatorRequest),
    ValidatorRemoval(ValidatorRemoval),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingAccountRequest {
    pub address: String,
    pub vesting_options: VestingOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VestingOptions {
    DelayedVesting(DelayedVesting),
    ContinuousVesting(ContinuousVesting),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayedVesting {
    pub total_balance: Coins,
    pub vesting: Coins,
    pub end_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuousVesting {
    pub total_balance: Coins,
    pub vesting: Coins,
    pub start_time: i64,
    pub end_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRemoval {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisValidatorRequest {
    pub address: String,
    #[serde(with = "base64_bytes")]
    pub gen_tx: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub cons_pub_key: Vec<u8>,
    pub self_delegation: Coin,
    pub peer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorRemoval {
    pub val_address: String,
}

impl Request {
    pub fn new(request_id: u64, content: RequestContent) -> Self {
        Self {
            request_id,
            content,
        }
    }

    /// Short name of the request kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self.content {
            RequestContent::GenesisAccount(_) => "genesis-account",
            RequestContent::VestingAccount(_) => "vesting-account",
            RequestContent::AccountRemoval(_) => "account-removal",
            RequestContent::GenesisValidator(_) => "genesis-validator",
            RequestContent::ValidatorRemoval(_) => "validator-removal",
        }
    }
}

impl VestingOptions {
    pub fn kind(&self) -> &'static str {
        match self {
            VestingOptions::DelayedVesting(_) => "delayed_vesting",
            VestingOptions::ContinuousVesting(_) => "continuous_vesting",
        }
    }
}

impl TryFrom<&VestingAccountRequest> for VestingAccount {
    type Error = GenesisError;

    fn try_from(request: &VestingAccountRequest) -> Result<Self, Self::Error> {
        match &request.vesting_options {
            VestingOptions::DelayedVesting(delayed) => Ok(VestingAccount {
                address: request.address.clone(),
                total_balance: delayed.total_balance.clone(),
                vesting: delayed.vesting.clone(),
                end_time: delayed.end_time,
            }),
            other => Err(GenesisError::UnsupportedVesting(other.kind().to_string())),
        }
    }
}

impl From<&GenesisValidatorRequest> for GenesisValidator {
    fn from(request: &GenesisValidatorRequest) -> Self {
        GenesisValidator {
            address: request.address.clone(),
            gen_tx: request.gen_tx.clone(),
            peer: request.peer.clone(),
            self_delegation: request.self_delegation.clone(),
        }
    }
}
