use anyhow::{bail, Result};
use clap::Parser;

use super::TargetOpts;

#[derive(Debug, Parser)]
#[command(about = "Point block rewards at an address")]
pub struct Opts {
    #[clap(flatten)]
    pub target: TargetOpts,

    /// 0x-prefixed 20-byte hex address
    pub address: String,
}

pub async fn run(opts: &Opts) -> Result<()> {
    if !mars_wallet::is_valid_address(&opts.address) {
        bail!("Invalid address: {}", opts.address);
    }
    opts.target.client().miner_set_etherbase(&opts.address).await?;
    println!("✓ Etherbase set to {}", opts.address);
    Ok(())
}
