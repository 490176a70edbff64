use launchpad_common::AddressError;
use thiserror::Error;

use crate::gentx::GentxError;

/// Errors raised while verifying requests or folding them into genesis.
///
/// `InvalidRequest` is the only business-rule variant: the request is well
/// formed but conflicts with the current genesis or with its own gentx. The
/// other variants mean the request payload itself cannot be interpreted.
#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("request {request_id} is invalid: {reason}")]
    InvalidRequest { request_id: u64, reason: String },

    #[error("unsupported vesting option {0}: only delayed vesting is supported")]
    UnsupportedVesting(String),

    #[error("invalid gentx: {0}")]
    Gentx(#[from] GentxError),

    #[error("invalid address in gentx: {0}")]
    Address(#[from] AddressError),
}

impl GenesisError {
    pub fn invalid_request(request_id: u64, reason: impl Into<String>) -> Self {
        GenesisError::InvalidRequest {
            request_id,
            reason: reason.into(),
        }
    }

    /// True for business-rule rejections, false for malformed payloads.
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, GenesisError::InvalidRequest { .. })
    }
}
