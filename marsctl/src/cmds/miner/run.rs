//! Run the supervisor in the foreground.
//!
//! Provisions the binary if needed, starts the requested tabs, streams
//! their log and state events, and tears everything down on
//! Ctrl+C/SIGTERM via `stop_all` on the one supervisor value.

use anyhow::{bail, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use mars_common::logging;
use mars_supervisor::{LogStream, MinerConfigPatch, MinerEvent, MinerService};
use tokio::sync::broadcast;

use crate::utils::RootOpts;

#[derive(Debug, Parser)]
#[command(about = "Run the supervisor with one or more miner tabs in the foreground")]
pub struct Opts {
    #[clap(flatten)]
    pub root: RootOpts,

    /// Number of miner tabs to run
    #[clap(long, default_value = "1")]
    pub tabs: u32,

    /// Mining threads per tab
    #[clap(long)]
    pub threads: Option<u32>,

    /// Geth cache size in MB per tab
    #[clap(long)]
    pub cache: Option<u32>,

    /// Etherbase address (defaults to the stored mining address)
    #[clap(long)]
    pub etherbase: Option<String>,

    /// Use this geth binary instead of the managed one
    #[clap(long)]
    pub geth: Option<PathBuf>,

    /// Log level (error|warn|info|debug|trace)
    #[clap(long)]
    pub log_level: Option<String>,

    /// Fail instead of downloading when no binary is installed
    #[clap(long)]
    pub no_download: bool,
}

pub async fn run(opts: &Opts) -> Result<()> {
    if opts.tabs < 1 {
        bail!("At least one tab is required");
    }
    if let Some(ref etherbase) = opts.etherbase {
        if !mars_wallet::is_valid_address(etherbase) {
            bail!("Invalid etherbase address: {}", etherbase);
        }
    }

    let layout = opts.root.layout()?;
    logging::init_logging(Some(&layout), opts.log_level.clone())?;

    let geth_path = ensure_binary(&layout, opts).await?;

    let service = Arc::new(MinerService::new(layout.clone()));
    service.set_geth_path(geth_path);
    spawn_event_printer(service.subscribe());

    for _ in 0..opts.tabs {
        let index = service.add_tab(None);
        let etherbase = match &opts.etherbase {
            Some(etherbase) => Some(etherbase.clone()),
            // A provisioned wallet is mined to without re-entry.
            None => mars_wallet::store::get_stored_mining_address(&layout, Some(index))?,
        };
        let patch = MinerConfigPatch {
            miner_threads: opts.threads,
            cache_mb: opts.cache,
            etherbase,
            ..Default::default()
        };
        if let Err(err) = service.start_miner(index, Some(&patch)).await {
            log::error!("Failed to start miner {}: {:#}", index, err);
        }
    }

    if service.get_running_miner_indices().is_empty() {
        bail!("No miner came up");
    }

    println!("Press Ctrl+C to stop.");
    wait_for_shutdown().await?;

    println!("\nShutting down...");
    service.stop_all().await;
    println!("✓ All miners stopped");
    Ok(())
}

async fn ensure_binary(layout: &mars_common::Layout, opts: &Opts) -> Result<PathBuf> {
    let status = mars_geth::binary::is_available(layout, opts.geth.clone()).await;
    if status.ok {
        log::info!(
            "Using geth {} at {}",
            status.version.unwrap_or_default(),
            status.path.display()
        );
        return Ok(status.path);
    }
    if opts.geth.is_some() {
        bail!("{} is not a runnable geth binary", status.path.display());
    }
    if opts.no_download {
        bail!("No geth binary installed; run 'marsctl geth download'");
    }

    println!("No geth binary found, downloading {}...", mars_geth::GETH_VERSION);
    let mut last_percent = 0u8;
    let installed = mars_geth::binary::download(layout, |progress| {
        if progress.percent != last_percent {
            last_percent = progress.percent;
            print!("\r   {}%", progress.percent);
            let _ = std::io::stdout().flush();
        }
    })
    .await?;
    println!();
    println!("✓ Installed geth {}", installed.version);
    Ok(installed.path)
}

fn spawn_event_printer(mut events: broadcast::Receiver<MinerEvent>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(MinerEvent::Log {
                    miner_index,
                    stream,
                    line,
                    ..
                }) => match stream {
                    LogStream::Stdout => println!("[miner {}] {}", miner_index, line),
                    LogStream::Stderr => println!("[miner {}!] {}", miner_index, line),
                },
                Ok(MinerEvent::State(state)) => {
                    if state.running {
                        log::info!(
                            "Miner {} running (PID {}, rpc {})",
                            state.miner_index,
                            state.pid.unwrap_or_default(),
                            state.rpc_url
                        );
                    } else {
                        log::info!("Miner {} stopped", state.miner_index);
                    }
                }
                Ok(MinerEvent::Exited {
                    miner_index,
                    code,
                    signal,
                }) => {
                    log::info!("Miner {} exited (code: {:?}, signal: {:?})", miner_index, code, signal);
                }
                Err(broadcast::error::RecvError::Lagged(dropped)) => {
                    log::warn!("Event printer lagged, dropped {} events", dropped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(())
    }
}
