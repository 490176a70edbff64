//! Stateless checks run on a request before it may touch the genesis.
//!
//! Only validator join requests carry something to cross-check: the claimed
//! address, consensus key and self-delegation must match what the embedded
//! gentx actually signs, and the peer string must be dialable.

use launchpad_common::{address::change_address_prefix, verify_peer_format, AddressError, PeerFormatError};
use thiserror::Error;

use crate::{
    error::GenesisError,
    gentx::{parse_gentx, GentxError},
    request::{GenesisValidatorRequest, Request, RequestContent},
};

/// Address prefix of the coordination chain.
pub const COORDINATOR_PREFIX: &str = "spn";

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Gentx(#[from] GentxError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("the validator address {request} doesn't match the delegator address inside the gentx {gentx}")]
    AddressMismatch { request: String, gentx: String },

    #[error("the consensus pub key {request} doesn't match the one inside the gentx {gentx}")]
    PubKeyMismatch { request: String, gentx: String },

    #[error("the self delegation {request} doesn't match the one inside the gentx {gentx}")]
    SelfDelegationMismatch { request: String, gentx: String },

    #[error(transparent)]
    Peer(#[from] PeerFormatError),
}

impl VerifyError {
    /// Whether the request payload itself is unreadable, as opposed to inconsistent.
    pub fn is_structural(&self) -> bool {
        matches!(self, VerifyError::Gentx(_) | VerifyError::Address(_))
    }

    fn into_genesis_error(self, request_id: u64) -> GenesisError {
        match self {
            VerifyError::Gentx(err) => GenesisError::Gentx(err),
            VerifyError::Address(err) => GenesisError::Address(err),
            mismatch => GenesisError::invalid_request(request_id, mismatch.to_string()),
        }
    }
}

/// Checks a validator join request against its own gentx.
///
/// Checks run in order (address, consensus key, self-delegation, peer
/// format) and the first failure is returned.
pub fn verify_add_validator_request(
    request: &GenesisValidatorRequest,
    coordinator_prefix: &str,
) -> Result<(), VerifyError> {
    let info = parse_gentx(&request.gen_tx)?;

    // The gentx is signed for the launched chain; compare under the coordinator's prefix.
    let delegator = change_address_prefix(&info.delegator_address, coordinator_prefix)?;
    if delegator.as_bytes() != request.address.as_bytes() {
        return Err(VerifyError::AddressMismatch {
            request: request.address.clone(),
            gentx: info.delegator_address,
        });
    }

    if info.pub_key != request.cons_pub_key {
        return Err(VerifyError::PubKeyMismatch {
            request: hex::encode(&request.cons_pub_key),
            gentx: hex::encode(&info.pub_key),
        });
    }

    if info.self_delegation != request.self_delegation {
        return Err(VerifyError::SelfDelegationMismatch {
            request: request.self_delegation.to_string(),
            gentx: info.self_delegation.to_string(),
        });
    }

    if !verify_peer_format(&request.peer) {
        return Err(PeerFormatError(request.peer.clone()).into());
    }

    Ok(())
}

/// Verifies a single request; only validator joins are checked at this layer.
///
/// Inconsistencies become [`GenesisError::InvalidRequest`]; an unreadable
/// gentx surfaces as a structural error.
pub fn verify_request(request: &Request, coordinator_prefix: &str) -> Result<(), GenesisError> {
    match &request.content {
        RequestContent::GenesisValidator(validator) => {
            verify_add_validator_request(validator, coordinator_prefix)
                .map_err(|err| err.into_genesis_error(request.request_id))
        }
        _ => Ok(()),
    }
}

pub fn verify_requests<'a, I>(requests: I, coordinator_prefix: &str) -> Result<(), GenesisError>
where
    I: IntoIterator<Item = &'a Request>,
{
    requests
        .into_iter()
        .try_for_each(|request| verify_request(request, coordinator_prefix))
}
