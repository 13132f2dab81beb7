use anyhow::{bail, Result};
use clap::Parser;

use crate::utils::{resolve_password, RootOpts};

#[derive(Debug, Parser)]
#[command(about = "Write an encrypted keystore into a miner directory")]
pub struct Opts {
    #[clap(flatten)]
    pub root: RootOpts,

    /// Target miner tab
    #[clap(long, default_value = "1")]
    pub miner: u32,

    /// Private key, 0x prefix optional (prompted when absent)
    #[clap(long)]
    pub key: Option<String>,

    /// Keystore password (prompted when absent)
    #[clap(long)]
    pub password: Option<String>,
}

pub async fn run(opts: &Opts) -> Result<()> {
    if opts.miner < 1 {
        bail!("Miner index is 1-based");
    }
    let layout = opts.root.layout()?;

    let key = match &opts.key {
        Some(key) => key.clone(),
        None => rpassword::prompt_password("Private key: ")?,
    };
    let password = resolve_password(&opts.password, "Keystore password: ")?;
    if opts.password.is_none() {
        let confirm = rpassword::prompt_password("Confirm password: ")?;
        if confirm != password {
            bail!("Passwords do not match");
        }
    }

    println!("Encrypting keystore (this takes a moment)...");
    let address = mars_wallet::keystore::write_keystore_to_miner(&layout, opts.miner, &key, &password)?;
    println!("✓ Keystore for {} written to {}", address, layout.miner_keystore_dir(opts.miner).display());
    Ok(())
}
