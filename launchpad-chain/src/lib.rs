//! Launch pipeline for chains coordinated through approved requests.
//!
//! [`chain::Chain`] drives a [`runtime::ChainRuntime`] through build, init and
//! genesis preparation; [`setup`] wires one from a [`config::LaunchConfig`].

pub mod cache;
pub mod chain;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod home;
pub mod logging;
pub mod runtime;
pub mod setup;
pub mod simulate;
pub mod source;

pub use cache::{BinaryCache, CacheError};
pub use chain::{Chain, ChainOptions, ChainState};
pub use config::LaunchConfig;
pub use error::{ChainError, FetchError, Phase};
pub use fetch::{GenesisFetcher, HttpGenesisFetcher};
pub use home::ChainHome;
pub use runtime::{ChainRuntime, ProcessRuntime, RuntimeError};
pub use simulate::simulate_requests;
pub use source::{FetchedSource, GitSourceFetcher, SourceFetcher, SourceRef};
