use anyhow::{bail, Result};
use clap::Parser;

use crate::utils::{resolve_password, RootOpts};

#[derive(Debug, Parser)]
#[command(about = "Encrypt and store the mnemonic")]
pub struct Opts {
    #[clap(flatten)]
    pub root: RootOpts,

    /// The phrase, quoted as a single argument; prompted when absent
    #[clap(long)]
    pub phrase: Option<String>,

    /// Password (prompted when absent)
    #[clap(long)]
    pub password: Option<String>,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let layout = opts.root.layout()?;

    let phrase = match &opts.phrase {
        Some(phrase) => phrase.clone(),
        None => rpassword::prompt_password("Mnemonic: ")?,
    };
    // Refuse to store something that will not import later.
    mars_wallet::import_from_mnemonic(&phrase)?;

    let password = resolve_password(&opts.password, "Password: ")?;
    if opts.password.is_none() {
        let confirm = rpassword::prompt_password("Confirm password: ")?;
        if confirm != password {
            bail!("Passwords do not match");
        }
    }

    mars_wallet::store::save_mnemonic(&layout, phrase.trim(), &password)?;
    println!("✓ Mnemonic stored at {}", layout.wallet_enc_path().display());
    Ok(())
}
