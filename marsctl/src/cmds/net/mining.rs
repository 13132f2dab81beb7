use anyhow::Result;
use clap::Parser;

use super::TargetOpts;

#[derive(Debug, Parser)]
#[command(about = "Whether the node is mining")]
pub struct Opts {
    #[clap(flatten)]
    pub target: TargetOpts,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let mining = opts.target.client().eth_mining().await?;
    println!("{}", if mining { "Mining" } else { "Not mining" });
    Ok(())
}
