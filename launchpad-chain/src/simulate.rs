use launchpad_genesis::{verify_requests, GenesisInformation, Request};
use tracing::info;

use crate::{chain::Chain, error::ChainError, runtime::ChainRuntime};

/// Verifies `requests`, folds them into `genesis_information` and prepares
/// `chain` with the result.
///
/// Meant for a throw-away home: it answers whether the chain would still
/// produce a valid genesis if the pending requests were approved.
pub async fn simulate_requests<R: ChainRuntime>(
    chain: &mut Chain<R>,
    genesis_information: GenesisInformation,
    requests: &[Request],
    coordinator_prefix: &str,
) -> Result<GenesisInformation, ChainError> {
    verify_requests(requests, coordinator_prefix)?;
    let genesis_information = genesis_information.apply_requests(requests)?;
    info!("🧪 Simulating {} requests", requests.len());

    chain.prepare(&genesis_information).await?;
    Ok(genesis_information)
}
