use anyhow::Result;
use clap::Parser;

use crate::utils::RootOpts;

#[derive(Debug, Parser)]
#[command(about = "Print the resolved geth binary path")]
pub struct Opts {
    #[clap(flatten)]
    pub root: RootOpts,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let layout = opts.root.layout()?;
    let path = layout.geth_binary_path();
    println!("{}", path.display());
    if !path.exists() {
        log::warn!("Binary does not exist yet; run 'marsctl geth download'");
    }
    Ok(())
}
