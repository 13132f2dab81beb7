use anyhow::{Context, Result};
use clap::Parser;
use mars_common::pid as pidfile;
use std::time::Duration;

use crate::utils::RootOpts;

#[derive(Debug, Parser)]
#[command(about = "Stop a miner by its PID file")]
pub struct Opts {
    #[clap(flatten)]
    pub root: RootOpts,

    /// Miner tab index
    #[clap(long, default_value = "1")]
    pub index: u32,

    /// Skip the graceful signal and kill immediately
    #[clap(long, short)]
    pub force: bool,
}

pub async fn run(opts: &Opts) -> Result<()> {
    let layout = opts.root.layout()?;
    let pid_path = layout.miner_pid_path(opts.index);

    let Some(pid) = pidfile::read_pid_file(&pid_path)? else {
        println!("Miner {} is not running (no PID file).", opts.index);
        return Ok(());
    };

    if !pidfile::is_process_alive(pid) {
        println!("⚠️  Miner {} PID {} is not running (stale PID file)", opts.index, pid);
        pidfile::remove_pid_file(&pid_path)?;
        return Ok(());
    }

    println!("Stopping miner {} (PID {})...", opts.index, pid);
    terminate(pid, opts.force).await?;

    pidfile::remove_pid_file(&pid_path)?;
    println!("✓ Miner {} stopped", opts.index);
    Ok(())
}

#[cfg(unix)]
async fn terminate(pid: u32, force: bool) -> Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let nix_pid = Pid::from_raw(pid as i32);
    let signal = if force { Signal::SIGKILL } else { Signal::SIGTERM };
    kill(nix_pid, signal).context("Failed to signal process")?;

    if !force {
        // Same grace the supervisor itself gives before escalating.
        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(500)).await;
            if kill(nix_pid, None).is_err() {
                return Ok(());
            }
        }
        println!("Process still running, sending SIGKILL...");
        kill(nix_pid, Signal::SIGKILL).context("Failed to force kill process")?;
    }
    Ok(())
}

#[cfg(not(unix))]
async fn terminate(pid: u32, force: bool) -> Result<()> {
    use anyhow::bail;

    let mut command = tokio::process::Command::new("taskkill");
    if force {
        command.arg("/F");
    }
    command.args(["/PID", &pid.to_string()]);
    let output = command.output().await.context("Failed to run taskkill")?;

    if !output.status.success() {
        if force {
            bail!("taskkill failed: {}", String::from_utf8_lossy(&output.stderr).trim());
        }
        // Graceful termination is best-effort on Windows; escalate on
        // the same deadline as Unix.
        tokio::time::sleep(Duration::from_secs(5)).await;
        let output = tokio::process::Command::new("taskkill")
            .args(["/F", "/PID", &pid.to_string()])
            .output()
            .await
            .context("Failed to run taskkill")?;
        if !output.status.success() {
            bail!("taskkill /F failed: {}", String::from_utf8_lossy(&output.stderr).trim());
        }
    }
    Ok(())
}
