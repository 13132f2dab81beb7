use anyhow::Result;
use clap::Parser;
use mars_common::{pid as pidfile, Layout, Ports};

use crate::utils::RootOpts;

#[derive(Debug, Parser)]
#[command(about = "List running miners")]
pub struct Opts {
    #[clap(flatten)]
    pub root: RootOpts,

    /// Also list tabs whose PID file points at a dead process
    #[clap(long)]
    pub all: bool,
}

#[derive(Debug)]
pub struct MinerProc {
    pub index: u32,
    pub pid: u32,
    pub alive: bool,
}

/// Scan `miners/*/geth.pid` and probe each recorded PID.
pub fn discover_miners(layout: &Layout) -> Result<Vec<MinerProc>> {
    let miners_dir = layout.miners_dir();
    if !miners_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in std::fs::read_dir(&miners_dir)? {
        let entry = entry?;
        let Some(index) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.parse::<u32>().ok())
        else {
            continue;
        };
        if let Some(pid) = pidfile::read_pid_file(&layout.miner_pid_path(index)).unwrap_or(None) {
            found.push(MinerProc {
                index,
                pid,
                alive: pidfile::is_process_alive(pid),
            });
        }
    }
    found.sort_by_key(|proc| proc.index);
    Ok(found)
}

pub async fn run(opts: &Opts) -> Result<()> {
    let layout = opts.root.layout()?;
    let miners = discover_miners(&layout)?;

    let shown: Vec<_> = miners
        .into_iter()
        .filter(|proc| proc.alive || opts.all)
        .collect();

    if shown.is_empty() {
        println!("No running miners.");
        return Ok(());
    }

    for proc in &shown {
        let rpc = Ports::for_index(proc.index).rpc_url();
        if proc.alive {
            println!("miner {}  PID {}  {}", proc.index, proc.pid, rpc);
        } else {
            println!("miner {}  PID {}  (stale PID file)", proc.index, proc.pid);
        }
    }
    println!();
    println!("{} miner(s)", shown.len());
    Ok(())
}
