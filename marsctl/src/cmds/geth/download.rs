use anyhow::Result;
use clap::Parser;
use std::io::Write;

use crate::utils::RootOpts;

#[derive(Debug, Parser)]
#[command(about = "Download and install the pinned geth release")]
pub struct Opts {
    #[clap(flatten)]
    pub root: RootOpts,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let layout = opts.root.layout()?;

    println!("⬇️  Downloading geth {}...", mars_geth::GETH_VERSION);
    let mut last_percent = 0u8;
    let installed = mars_geth::binary::download(&layout, |progress| {
        if progress.percent != last_percent {
            last_percent = progress.percent;
            print!(
                "\r   {}% ({} / {} bytes)",
                progress.percent, progress.downloaded_bytes, progress.total_bytes
            );
            let _ = std::io::stdout().flush();
        }
    })
    .await?;
    println!();

    println!("✓ Installed geth {} at {}", installed.version, installed.path.display());
    if installed.used_fallback {
        println!("  (no native build for this platform, installed a compatible one)");
    }
    Ok(())
}
