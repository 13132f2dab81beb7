use anyhow::Result;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(about = "Import a wallet from a raw private key")]
pub struct Opts {
    /// 64 hex chars, `0x` prefix optional; prompted when absent
    pub key: Option<String>,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let key = match &opts.key {
        Some(key) => key.clone(),
        None => rpassword::prompt_password("Private key: ")?,
    };

    let wallet = mars_wallet::import_from_private_key(&key)?;
    println!("Address: {}", wallet.address);
    Ok(())
}
