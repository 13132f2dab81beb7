//! Tail a miner's log file.
//!
//! The per-miner `geth.log` is written by the supervisor's log pump;
//! this command replays its tail and can keep following appended
//! lines until Ctrl+C.

use anyhow::{bail, Context, Result};
use clap::Parser;
use mars_common::pid as pidfile;
use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::utils::RootOpts;

#[derive(Debug, Parser)]
#[command(about = "Tail a miner's log file")]
pub struct Opts {
    #[clap(flatten)]
    pub root: RootOpts,

    /// Miner tab index
    #[clap(long, default_value = "1")]
    pub index: u32,

    /// Number of lines to show from the end of the log
    #[clap(long, short = 'n', default_value = "50")]
    pub lines: usize,

    /// Keep following appended lines (stop with Ctrl+C)
    #[clap(long, short)]
    pub follow: bool,

    /// Show logs even if the miner is not running
    #[clap(long)]
    pub offline: bool,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let layout = opts.root.layout()?;

    if !opts.offline {
        let running = pidfile::read_pid_file(&layout.miner_pid_path(opts.index))
            .unwrap_or(None)
            .map(pidfile::is_process_alive)
            .unwrap_or(false);
        if !running {
            bail!(
                "Miner {} is not running. Use --offline to view logs anyway.",
                opts.index
            );
        }
    }

    let log_path = layout.miner_log_file(opts.index);
    if !log_path.exists() {
        bail!(
            "No log file at {}. Has the miner been started?",
            log_path.display()
        );
    }

    tail(&log_path, opts.lines, opts.follow).await
}

/// Replay the last `keep` lines, then optionally follow appends.
///
/// The reader stays parked at EOF between polls; a regular file hands
/// back whatever the supervisor appended since, so no reopen or seek
/// bookkeeping is needed.
async fn tail(path: &Path, keep: usize, follow: bool) -> Result<()> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Cannot open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut line = String::new();

    let mut backlog: VecDeque<String> = VecDeque::with_capacity(keep.min(1024));
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }
        if keep == 0 {
            continue;
        }
        if backlog.len() == keep {
            backlog.pop_front();
        }
        backlog.push_back(line.trim_end().to_string());
    }
    for entry in &backlog {
        println!("{}", entry);
    }

    if !follow {
        return Ok(());
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut poll = tokio::time::interval(Duration::from_millis(250));

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = poll.tick() => {
                loop {
                    line.clear();
                    match reader.read_line(&mut line).await {
                        Ok(0) => break,
                        Ok(_) => println!("{}", line.trim_end()),
                        Err(err) => {
                            log::warn!("Reading {} failed: {}", path.display(), err);
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
