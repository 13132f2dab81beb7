use anyhow::Result;
use clap::Parser;

use crate::utils::RootOpts;

#[derive(Debug, Parser)]
#[command(about = "Set an address-only mining target")]
pub struct Opts {
    #[clap(flatten)]
    pub root: RootOpts,

    /// 0x-prefixed 20-byte hex address
    pub address: String,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let layout = opts.root.layout()?;
    mars_wallet::store::set_address_only(&layout, &opts.address)?;
    println!("✓ Mining address set to {}", opts.address.trim());
    println!("  Stored in {}", layout.mining_address_path().display());
    Ok(())
}
