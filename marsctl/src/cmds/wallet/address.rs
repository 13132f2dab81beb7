use anyhow::Result;
use clap::Parser;

use crate::utils::RootOpts;

#[derive(Debug, Parser)]
#[command(about = "Show the stored mining address")]
pub struct Opts {
    #[clap(flatten)]
    pub root: RootOpts,

    /// Also consult this miner's keystore as a fallback
    #[clap(long)]
    pub miner: Option<u32>,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let layout = opts.root.layout()?;
    match mars_wallet::store::get_stored_mining_address(&layout, opts.miner)? {
        Some(address) => println!("{}", address),
        None => {
            println!("No mining address configured.");
            println!("Use 'marsctl wallet set-address' or 'marsctl wallet write-keystore'.");
        }
    }
    Ok(())
}
