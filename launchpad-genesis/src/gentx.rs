//! Gentx bundle parsing.
//!
//! Only the fields needed to cross-check a validator join request are read:
//! `body.messages[0].{delegator_address, validator_address, pubkey.key, value}`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use launchpad_common::{
    coin::{parse_amount, CoinError},
    Coin,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GentxError {
    #[error("malformed gentx document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("the gentx must contain exactly one message, found {0}")]
    MessageCount(usize),

    #[error("invalid gentx public key: {0}")]
    PubKey(#[from] base64::DecodeError),

    #[error("invalid gentx self-delegation: {0}")]
    Coin(#[from] CoinError),
}

/// What a validator commits to in its gentx.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GentxInfo {
    pub delegator_address: String,
    pub validator_address: String,
    pub pub_key: Vec<u8>,
    pub self_delegation: Coin,
}

#[derive(Deserialize)]
struct Gentx {
    body: GentxBody,
}

#[derive(Deserialize)]
struct GentxBody {
    messages: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct CreateValidatorMessage {
    delegator_address: String,
    validator_address: String,
    pubkey: GentxPubKey,
    value: RawCoin,
}

#[derive(Deserialize)]
struct GentxPubKey {
    key: String,
}

#[derive(Deserialize)]
struct RawCoin {
    denom: String,
    amount: String,
}

pub fn parse_gentx(gentx: &[u8]) -> Result<GentxInfo, GentxError> {
    let Gentx { body } = serde_json::from_slice(gentx)?;

    let message = match <[serde_json::Value; 1]>::try_from(body.messages) {
        Ok([message]) => message,
        Err(messages) => return Err(GentxError::MessageCount(messages.len())),
    };
    let message: CreateValidatorMessage = serde_json::from_value(message)?;

    let pub_key = STANDARD.decode(message.pubkey.key)?;
    let amount = parse_amount(&message.value.amount)?;
    let self_delegation = Coin::new(message.value.denom, amount)?;

    Ok(GentxInfo {
        delegator_address: message.delegator_address,
        validator_address: message.validator_address,
        pub_key,
        self_delegation,
    })
}
