use std::path::PathBuf;

use clap::{Parser, Subcommand};
use launchpad_genesis::COORDINATOR_PREFIX;

#[derive(Parser, Debug)]
#[command(name = "launchpad", author, version, about = "Prepares chain homes from approved launch requests", long_about = None)]
pub struct Args {
    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the chain and write a genesis from the approved requests
    Prepare {
        /// Launch configuration (JSON)
        #[arg(long)]
        config: PathBuf,

        /// Approved requests (JSON array)
        #[arg(long)]
        requests: PathBuf,
    },

    /// Check validator requests against their gentxs
    Verify {
        #[arg(long)]
        requests: PathBuf,

        #[arg(long, default_value = COORDINATOR_PREFIX)]
        coordinator_prefix: String,
    },

    /// Prepare a throw-away home with approved and pending requests applied
    Simulate {
        #[arg(long)]
        config: PathBuf,

        #[arg(long)]
        approved: PathBuf,

        #[arg(long)]
        pending: PathBuf,
    },
}
