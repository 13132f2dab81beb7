use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Write a child PID to a miner's `geth.pid` file.
///
/// The PID file is the single source of truth for external observers:
/// it exists iff a child is believed running.
pub fn write_pid_file(path: &Path, pid: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, pid.to_string())
        .with_context(|| format!("Failed to write PID file: {}", path.display()))?;
    log::debug!("PID file written: {} (PID: {})", path.display(), pid);
    Ok(())
}

/// Remove a PID file if present.
pub fn remove_pid_file(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove PID file: {}", path.display()))?;
        log::debug!("PID file removed: {}", path.display());
    }
    Ok(())
}

/// Read a PID file, returning `None` when it does not exist.
pub fn read_pid_file(path: &Path) -> Result<Option<u32>> {
    if !path.exists() {
        return Ok(None);
    }
    let pid_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read PID file: {}", path.display()))?;
    let pid: u32 = pid_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid PID in file: {}", path.display()))?;
    Ok(Some(pid))
}

/// Check whether a process with the given PID is alive.
#[cfg(unix)]
pub fn is_process_alive(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;
    kill(Pid::from_raw(pid as i32), None).is_ok()
}

#[cfg(not(unix))]
pub fn is_process_alive(_pid: u32) -> bool {
    // No cheap probe without extra tooling; assume alive and let the
    // health checker sort it out.
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geth.pid");

        assert_eq!(read_pid_file(&path).unwrap(), None);

        write_pid_file(&path, 4242).unwrap();
        assert_eq!(read_pid_file(&path).unwrap(), Some(4242));

        remove_pid_file(&path).unwrap();
        assert_eq!(read_pid_file(&path).unwrap(), None);
        // Removing twice is fine.
        remove_pid_file(&path).unwrap();
    }

    #[test]
    fn test_garbage_pid_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geth.pid");
        std::fs::write(&path, "not-a-pid").unwrap();
        assert!(read_pid_file(&path).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_own_process_is_alive() {
        assert!(is_process_alive(std::process::id()));
    }
}
