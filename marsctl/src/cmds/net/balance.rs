use anyhow::{bail, Result};
use clap::Parser;

use super::TargetOpts;
use crate::utils::RootOpts;

#[derive(Debug, Parser)]
#[command(about = "Balance of an address, falling back to the remote endpoint")]
pub struct Opts {
    #[clap(flatten)]
    pub root: RootOpts,

    #[clap(flatten)]
    pub target: TargetOpts,

    /// Address to query (defaults to the stored mining address)
    pub address: Option<String>,

    /// Skip the local node and go straight to the remote endpoint
    #[clap(long)]
    pub remote: bool,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let address = match &opts.address {
        Some(address) => address.clone(),
        None => {
            let layout = opts.root.layout()?;
            match mars_wallet::store::get_stored_mining_address(&layout, Some(opts.target.miner))? {
                Some(address) => address,
                None => bail!("No address given and no mining address configured"),
            }
        }
    };
    if !mars_wallet::is_valid_address(&address) {
        bail!("Invalid address: {}", address);
    }

    let local = if opts.remote { None } else { Some(opts.target.url()) };
    let wei = mars_rpc::get_balance_prefer_local(local.as_deref(), &address).await?;
    let mars = mars_rpc::wei_to_mars(&wei)?;

    println!("{} MARS", mars);
    println!("({} wei, address {})", wei, address);
    Ok(())
}
