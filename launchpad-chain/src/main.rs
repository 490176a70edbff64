use clap::Parser;
use launchpad_chain::{
    cli::{Args, Command},
    config::{default_base_dir, LaunchConfig},
    logging::init_logging,
    setup::{fetch_source, load_requests, process_chain},
    simulate_requests,
};
use launchpad_genesis::{verify_request, verify_requests, GenesisInformation};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let _guard = init_logging(args.log_file.as_deref());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    match args.command {
        Command::Prepare { config, requests } => {
            let config = LaunchConfig::load_from_file(&config)?;
            let requests = load_requests(&requests)?;
            let base = default_base_dir();

            verify_requests(&requests, &config.coordinator_prefix)?;
            let genesis_information = GenesisInformation::default().apply_requests(&requests)?;

            let source = fetch_source(&config, &base, &cancel).await?;
            let mut chain = process_chain(&config, &base, source, None);
            chain.prepare(&genesis_information).await?;

            println!(
                "prepared {} at {} ({} accounts, {} vesting accounts, {} validators)",
                config.chain_id,
                chain.home().root().display(),
                genesis_information.genesis_accounts().len(),
                genesis_information.vesting_accounts().len(),
                genesis_information.genesis_validators().len(),
            );
        }

        Command::Verify {
            requests,
            coordinator_prefix,
        } => {
            let requests = load_requests(&requests)?;
            let mut rejected = 0;
            for request in &requests {
                if let Err(err) = verify_request(request, &coordinator_prefix) {
                    error!("❌ {err}");
                    rejected += 1;
                }
            }

            println!("verified {} requests, {} rejected", requests.len(), rejected);
            if rejected > 0 {
                return Err(format!("{rejected} requests failed verification").into());
            }
        }

        Command::Simulate {
            config,
            approved,
            pending,
        } => {
            let config = LaunchConfig::load_from_file(&config)?;
            let approved = load_requests(&approved)?;
            let pending = load_requests(&pending)?;
            let base = default_base_dir();

            let genesis_information = GenesisInformation::default().apply_requests(&approved)?;

            let source = fetch_source(&config, &base, &cancel).await?;
            let home = tempfile::Builder::new().prefix("launchpad-simulate-").tempdir()?;
            let mut chain = process_chain(&config, &base, source, Some(home.path().join("home")));

            let genesis_information = simulate_requests(
                &mut chain,
                genesis_information,
                &pending,
                &config.coordinator_prefix,
            )
            .await?;

            println!(
                "simulated {} pending requests on {}: {} accounts, {} vesting accounts, {} validators",
                pending.len(),
                config.chain_id,
                genesis_information.genesis_accounts().len(),
                genesis_information.vesting_accounts().len(),
                genesis_information.genesis_validators().len(),
            );
        }
    }

    Ok(())
}
