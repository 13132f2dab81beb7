use anyhow::Result;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(about = "Generate a new 12-word wallet")]
pub struct Opts {}

pub async fn run(_opts: &Opts) -> Result<()> {
    let wallet = mars_wallet::generate()?;

    println!("Address:     {}", wallet.address);
    println!("Mnemonic:    {}", wallet.mnemonic);
    println!("Private key: {}", wallet.private_key);
    println!();
    println!("⚠️  Write the mnemonic down. Nothing is persisted by this command;");
    println!("   use 'marsctl wallet save-mnemonic' or 'marsctl wallet write-keystore'.");
    Ok(())
}
