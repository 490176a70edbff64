//! Genesis data set of a launch and the requests that shape it.
//!
//! Requests approved on the coordination chain are verified one by one
//! ([`verifier`]) and folded into a [`GenesisInformation`] with
//! [`GenesisInformation::apply_request`].

pub mod error;
pub mod gentx;
pub mod information;
pub mod request;
pub mod types;
pub mod verifier;

pub use error::GenesisError;
pub use gentx::{parse_gentx, GentxError, GentxInfo};
pub use information::GenesisInformation;
pub use request::{
    AccountRemoval, ContinuousVesting, DelayedVesting, GenesisValidatorRequest, Request,
    RequestContent, ValidatorRemoval, VestingAccountRequest, VestingOptions,
};
pub use types::{GenesisAccount, GenesisValidator, VestingAccount};
pub use verifier::{
    verify_add_validator_request, verify_request, verify_requests, VerifyError,
    COORDINATOR_PREFIX,
};
