use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::GenesisError,
    request::{Request, RequestContent},
    types::{GenesisAccount, GenesisValidator, VestingAccount},
};

/// The genesis data set of a launch, keyed by address.
///
/// An address is in at most one of the two account maps and at most once in
/// the validator map. Maps are ordered by address so every projection and
/// every file derived from them is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisInformation {
    genesis_accounts: BTreeMap<String, GenesisAccount>,
    vesting_accounts: BTreeMap<String, VestingAccount>,
    genesis_validators: BTreeMap<String, GenesisValidator>,
}

impl GenesisInformation {
    /// Builds the maps from lists; a later entry for the same address replaces an earlier one.
    pub fn new(
        genesis_accounts: Vec<GenesisAccount>,
        vesting_accounts: Vec<VestingAccount>,
        genesis_validators: Vec<GenesisValidator>,
    ) -> Self {
        let mut gi = Self::default();
        for account in genesis_accounts {
            gi.add_genesis_account(account);
        }
        for account in vesting_accounts {
            gi.add_vesting_account(account);
        }
        for validator in genesis_validators {
            gi.add_genesis_validator(validator);
        }
        gi
    }

    pub fn genesis_accounts(&self) -> Vec<GenesisAccount> {
        self.genesis_accounts.values().cloned().collect()
    }

    pub fn vesting_accounts(&self) -> Vec<VestingAccount> {
        self.vesting_accounts.values().cloned().collect()
    }

    pub fn genesis_validators(&self) -> Vec<GenesisValidator> {
        self.genesis_validators.values().cloned().collect()
    }

    pub fn contains_genesis_account(&self, address: &str) -> bool {
        self.genesis_accounts.contains_key(address)
    }

    pub fn contains_vesting_account(&self, address: &str) -> bool {
        self.vesting_accounts.contains_key(address)
    }

    pub fn contains_genesis_validator(&self, address: &str) -> bool {
        self.genesis_validators.contains_key(address)
    }

    pub fn add_genesis_account(&mut self, account: GenesisAccount) {
        self.genesis_accounts.insert(account.address.clone(), account);
    }

    pub fn add_vesting_account(&mut self, account: VestingAccount) {
        self.vesting_accounts.insert(account.address.clone(), account);
    }

    pub fn add_genesis_validator(&mut self, validator: GenesisValidator) {
        self.genesis_validators
            .insert(validator.address.clone(), validator);
    }

    pub fn remove_genesis_account(&mut self, address: &str) -> Option<GenesisAccount> {
        self.genesis_accounts.remove(address)
    }

    pub fn remove_vesting_account(&mut self, address: &str) -> Option<VestingAccount> {
        self.vesting_accounts.remove(address)
    }

    pub fn remove_genesis_validator(&mut self, address: &str) -> Option<GenesisValidator> {
        self.genesis_validators.remove(address)
    }

    fn contains_account(&self, address: &str) -> bool {
        self.contains_genesis_account(address) || self.contains_vesting_account(address)
    }

    /// Folds one request into the genesis.
    ///
    /// Pure: the result depends only on `self` and `request`. On error the
    /// input is consumed and nothing is returned, so a caller holding a
    /// clone keeps the last consistent state.
    pub fn apply_request(mut self, request: &Request) -> Result<Self, GenesisError> {
        let id = request.request_id;
        debug!(request_id = id, kind = request.kind(), "applying request");

        match &request.content {
            RequestContent::GenesisAccount(account) => {
                if self.contains_account(&account.address) {
                    return Err(GenesisError::invalid_request(
                        id,
                        "genesis account already in genesis",
                    ));
                }
                self.add_genesis_account(account.clone());
            }
            RequestContent::VestingAccount(vesting) => {
                let account = VestingAccount::try_from(vesting)?;
                if self.contains_account(&account.address) {
                    return Err(GenesisError::invalid_request(
                        id,
                        "vesting account already in genesis",
                    ));
                }
                self.add_vesting_account(account);
            }
            RequestContent::AccountRemoval(removal) => {
                if !self.contains_account(&removal.address) {
                    return Err(GenesisError::invalid_request(
                        id,
                        "account can't be removed because it doesn't exist",
                    ));
                }
                self.remove_genesis_account(&removal.address);
                self.remove_vesting_account(&removal.address);
            }
            RequestContent::GenesisValidator(validator) => {
                if self.contains_genesis_validator(&validator.address) {
                    return Err(GenesisError::invalid_request(
                        id,
                        "genesis validator already in genesis",
                    ));
                }
                self.add_genesis_validator(GenesisValidator::from(validator));
            }
            RequestContent::ValidatorRemoval(removal) => {
                if self.remove_genesis_validator(&removal.val_address).is_none() {
                    return Err(GenesisError::invalid_request(
                        id,
                        "genesis validator can't be removed because it doesn't exist",
                    ));
                }
            }
        }

        Ok(self)
    }

    /// Applies `requests` in order; the first failing request aborts the fold.
    pub fn apply_requests<'a, I>(self, requests: I) -> Result<Self, GenesisError>
    where
        I: IntoIterator<Item = &'a Request>,
    {
        requests
            .into_iter()
            .try_fold(self, |gi, request| gi.apply_request(request))
    }
}
