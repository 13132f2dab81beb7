use anyhow::Result;
use clap::Parser;

use super::TargetOpts;

#[derive(Debug, Parser)]
#[command(about = "Peer count")]
pub struct Opts {
    #[clap(flatten)]
    pub target: TargetOpts,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let peers = opts.target.client().net_peer_count().await?;
    println!("{} peer(s)", peers);
    Ok(())
}
