use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::utils::RootOpts;

#[derive(Debug, Parser)]
#[command(about = "Check whether a runnable geth binary is installed")]
pub struct Opts {
    #[clap(flatten)]
    pub root: RootOpts,

    /// Probe this binary instead of the resolved path
    #[clap(long)]
    pub path: Option<PathBuf>,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let layout = opts.root.layout()?;
    let status = mars_geth::binary::is_available(&layout, opts.path.clone()).await;

    if status.ok {
        println!("✓ geth {} at {}", status.version.unwrap_or_default(), status.path.display());
    } else {
        println!("✗ No runnable geth at {}", status.path.display());
        println!("  Run 'marsctl geth download' to install it");
    }
    Ok(())
}
