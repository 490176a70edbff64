use std::{fmt, io};

use launchpad_common::{AddressError, PeerFormatError};
use launchpad_genesis::GenesisError;
use thiserror::Error;

use crate::{cache::CacheError, runtime::RuntimeError};

/// Logical step of the launch pipeline, attached to external failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    RemoveHome,
    Build,
    CacheBinary,
    InitChain,
    FetchGenesis,
    WriteGenesis,
    ValidateGenesis,
    DetectPrefix,
    ApplyAccounts,
    ApplyVestingAccounts,
    ApplyValidators,
    UpdatePeers,
    SetGenesisTime,
    UnsafeReset,
    ShowNodeId,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            Phase::RemoveHome => "removing the chain home",
            Phase::Build => "building the chain binary",
            Phase::CacheBinary => "caching the chain binary",
            Phase::InitChain => "initializing the chain",
            Phase::FetchGenesis => "fetching the genesis",
            Phase::WriteGenesis => "writing the genesis",
            Phase::ValidateGenesis => "validating the genesis",
            Phase::DetectPrefix => "detecting the address prefix",
            Phase::ApplyAccounts => "applying genesis accounts",
            Phase::ApplyVestingAccounts => "applying vesting accounts",
            Phase::ApplyValidators => "applying genesis validators",
            Phase::UpdatePeers => "updating persistent peers",
            Phase::SetGenesisTime => "setting the genesis time",
            Phase::UnsafeReset => "resetting the chain state",
            Phase::ShowNodeId => "reading the node id",
        };
        f.write_str(phase)
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch cancelled")]
    Cancelled,

    #[error("git failed: {0}")]
    Git(#[from] RuntimeError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("error {phase}: {source}")]
    Phase {
        phase: Phase,
        #[source]
        source: Box<ChainError>,
    },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("genesis from URL {url} is invalid. expected hash {expected}, actual hash {actual}")]
    GenesisHashMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("invalid genesis document: {0}")]
    InvalidGenesis(String),

    #[error("genesis JSON error: {0}")]
    GenesisJson(#[from] serde_json::Error),

    #[error("invalid node configuration: {0}")]
    NodeConfig(#[from] toml_edit::TomlError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Genesis(#[from] GenesisError),

    #[error(transparent)]
    Peer(#[from] PeerFormatError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ChainError {
    /// The pipeline step that failed, if the error was raised inside one.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            ChainError::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// The error with any phase context stripped.
    pub fn root(&self) -> &ChainError {
        match self {
            ChainError::Phase { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Attaches a [`Phase`] to a failing result.
pub(crate) trait PhaseExt<T> {
    fn phase(self, phase: Phase) -> Result<T, ChainError>;
}

impl<T, E: Into<ChainError>> PhaseExt<T> for Result<T, E> {
    fn phase(self, phase: Phase) -> Result<T, ChainError> {
        self.map_err(|err| ChainError::Phase {
            phase,
            source: Box::new(err.into()),
        })
    }
}
