use anyhow::Result;
use clap::Parser;
use mars_wallet::WalletMode;

use crate::utils::RootOpts;

#[derive(Debug, Parser)]
#[command(about = "Summarize persisted wallet state")]
pub struct Opts {
    #[clap(flatten)]
    pub root: RootOpts,

    /// Include this miner's keystore in the summary
    #[clap(long)]
    pub miner: Option<u32>,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let layout = opts.root.layout()?;
    let Some(info) = mars_wallet::store::wallet_info(&layout, opts.miner)? else {
        println!("No wallet configured.");
        return Ok(());
    };

    println!("Address:      {}", info.address);
    println!(
        "Mode:         {}",
        match info.mode {
            WalletMode::Full => "full",
            WalletMode::AddressOnly => "address-only",
        }
    );
    println!("Mnemonic:     {}", if info.has_mnemonic { "stored" } else { "none" });
    println!("Private key:  {}", if info.has_private_key { "keystore present" } else { "none" });
    Ok(())
}
