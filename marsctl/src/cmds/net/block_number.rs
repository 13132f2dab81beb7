use anyhow::Result;
use clap::Parser;

use super::TargetOpts;

#[derive(Debug, Parser)]
#[command(about = "Latest block number")]
pub struct Opts {
    #[clap(flatten)]
    pub target: TargetOpts,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let block = opts.target.client().eth_block_number().await?;
    println!("{}", block);
    Ok(())
}
