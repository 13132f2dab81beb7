use anyhow::Result;
use clap::Parser;
use mars_rpc::SyncStatus;

use super::TargetOpts;

#[derive(Debug, Parser)]
#[command(about = "Sync status")]
pub struct Opts {
    #[clap(flatten)]
    pub target: TargetOpts,
}

pub async fn run(opts: &Opts) -> Result<()> {
    match opts.target.client().eth_syncing().await? {
        SyncStatus::NotSyncing => println!("In sync"),
        SyncStatus::Syncing {
            current_block,
            highest_block,
        } => println!("Syncing: block {} of {}", current_block, highest_block),
    }
    Ok(())
}
