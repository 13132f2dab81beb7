use anyhow::Result;
use clap::Parser;

use crate::utils::{resolve_password, RootOpts};

#[derive(Debug, Parser)]
#[command(about = "Decrypt and print the stored mnemonic")]
pub struct Opts {
    #[clap(flatten)]
    pub root: RootOpts,

    /// Password (prompted when absent)
    #[clap(long)]
    pub password: Option<String>,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let layout = opts.root.layout()?;
    let password = resolve_password(&opts.password, "Password: ")?;

    match mars_wallet::store::load_mnemonic(&layout, &password)? {
        Some(phrase) => println!("{}", phrase),
        None => println!("No stored mnemonic at {}", layout.wallet_enc_path().display()),
    }
    Ok(())
}
