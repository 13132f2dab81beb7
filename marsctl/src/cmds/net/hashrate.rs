use anyhow::Result;
use clap::Parser;

use super::TargetOpts;

#[derive(Debug, Parser)]
#[command(about = "Reported hashrate")]
pub struct Opts {
    #[clap(flatten)]
    pub target: TargetOpts,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let hashrate = opts.target.client().eth_hashrate().await?;
    println!("{} H/s", hashrate);
    Ok(())
}
