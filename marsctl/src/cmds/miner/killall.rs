use anyhow::Result;
use clap::Parser;
use mars_common::pid as pidfile;

use crate::utils::RootOpts;

#[derive(Debug, Parser)]
#[command(about = "Stop every running miner")]
pub struct Opts {
    #[clap(flatten)]
    pub root: RootOpts,

    /// Skip the graceful signal and kill immediately
    #[clap(long, short)]
    pub force: bool,

    /// Show what would be stopped without doing it
    #[clap(long)]
    pub dry_run: bool,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let layout = opts.root.layout()?;
    let miners = super::ps::discover_miners(&layout)?;

    if miners.is_empty() {
        println!("No running miners.");
        return Ok(());
    }

    if opts.dry_run {
        println!("DRY RUN - would stop:");
        for proc in miners.iter().filter(|p| p.alive) {
            println!("  miner {} (PID {})", proc.index, proc.pid);
        }
        return Ok(());
    }

    let mut stopped = 0;
    let mut stale = 0;
    let mut errors = 0;

    for proc in miners {
        let pid_path = layout.miner_pid_path(proc.index);
        if !proc.alive {
            let _ = pidfile::remove_pid_file(&pid_path);
            stale += 1;
            continue;
        }

        print!("Stopping miner {} (PID {})... ", proc.index, proc.pid);
        match signal_miner(proc.pid, opts.force) {
            Ok(()) => {
                println!("✓");
                let _ = pidfile::remove_pid_file(&pid_path);
                stopped += 1;
            }
            Err(err) => {
                println!("✗ {}", err);
                errors += 1;
            }
        }
    }

    println!();
    println!("Stopped: {}", stopped);
    if stale > 0 {
        println!("Stale PID files cleaned: {}", stale);
    }
    if errors > 0 {
        println!("Errors: {}", errors);
    }
    Ok(())
}

#[cfg(unix)]
fn signal_miner(pid: u32, force: bool) -> Result<()> {
    use anyhow::Context;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let signal = if force { Signal::SIGKILL } else { Signal::SIGTERM };
    kill(Pid::from_raw(pid as i32), signal).context("signal failed")?;
    Ok(())
}

#[cfg(not(unix))]
fn signal_miner(pid: u32, force: bool) -> Result<()> {
    use anyhow::bail;

    let mut command = std::process::Command::new("taskkill");
    if force {
        command.arg("/F");
    }
    let output = command.args(["/PID", &pid.to_string()]).output()?;
    if !output.status.success() {
        bail!("taskkill failed");
    }
    Ok(())
}
