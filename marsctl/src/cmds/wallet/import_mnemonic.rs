use anyhow::Result;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(about = "Import a wallet from a BIP39 mnemonic")]
pub struct Opts {
    /// The phrase, quoted as a single argument; prompted when absent
    pub phrase: Option<String>,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let phrase = match &opts.phrase {
        Some(phrase) => phrase.clone(),
        None => rpassword::prompt_password("Mnemonic: ")?,
    };

    let wallet = mars_wallet::import_from_mnemonic(&phrase)?;
    println!("Address:     {}", wallet.address);
    println!("Private key: {}", wallet.private_key);
    Ok(())
}
