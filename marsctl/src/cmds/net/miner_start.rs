use anyhow::Result;
use clap::Parser;

use super::TargetOpts;

#[derive(Debug, Parser)]
#[command(about = "Start mining via RPC")]
pub struct Opts {
    #[clap(flatten)]
    pub target: TargetOpts,

    /// Mining threads
    #[clap(long, default_value = "1")]
    pub threads: u32,
}

pub async fn run(opts: &Opts) -> Result<()> {
    opts.target.client().miner_start(opts.threads).await?;
    println!("✓ Mining started with {} thread(s)", opts.threads);
    Ok(())
}
