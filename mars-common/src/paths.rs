use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};

/// Deterministic on-disk layout for the supervisor.
///
/// All paths are derived from a single root directory, by default
/// `<home>/.marscredit`. The layout itself performs no I/O; directories
/// are created lazily by the components that own them.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Layout rooted at `<home>/.marscredit`.
    pub fn default_root() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))?;
        Ok(Self::new(home.join(".marscredit")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolved Geth binary path, `bin/geth` (`geth.exe` on Windows).
    pub fn geth_binary_path(&self) -> PathBuf {
        let name = if cfg!(windows) { "geth.exe" } else { "geth" };
        self.root.join("bin").join(name)
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Per-instance data directory, `miners/<i>`.
    pub fn miner_data_dir(&self, index: u32) -> PathBuf {
        self.root.join("miners").join(index.to_string())
    }

    pub fn miners_dir(&self) -> PathBuf {
        self.root.join("miners")
    }

    pub fn miner_keystore_dir(&self, index: u32) -> PathBuf {
        self.miner_data_dir(index).join("keystore")
    }

    pub fn miner_logs_dir(&self, index: u32) -> PathBuf {
        self.miner_data_dir(index).join("logs")
    }

    pub fn miner_log_file(&self, index: u32) -> PathBuf {
        self.miner_logs_dir(index).join("geth.log")
    }

    pub fn miner_pid_path(&self, index: u32) -> PathBuf {
        self.miner_data_dir(index).join("geth.pid")
    }

    /// Presence of this directory means the instance is initialized.
    pub fn miner_chaindata_dir(&self, index: u32) -> PathBuf {
        self.miner_data_dir(index).join("geth").join("chaindata")
    }

    pub fn wallet_enc_path(&self) -> PathBuf {
        self.root.join("wallet.enc")
    }

    pub fn mining_address_path(&self) -> PathBuf {
        self.root.join("mining_address.txt")
    }

    pub fn genesis_path(&self) -> PathBuf {
        self.root.join("genesis.json")
    }

    /// Supervisor log directory (`logs/app.log` lives here).
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn app_log_path(&self) -> PathBuf {
        self.logs_dir().join("app.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_rooted() {
        let layout = Layout::new("/tmp/mc-test");
        assert_eq!(layout.miner_data_dir(1), PathBuf::from("/tmp/mc-test/miners/1"));
        assert_eq!(
            layout.miner_keystore_dir(3),
            PathBuf::from("/tmp/mc-test/miners/3/keystore")
        );
        assert_eq!(
            layout.miner_pid_path(2),
            PathBuf::from("/tmp/mc-test/miners/2/geth.pid")
        );
        assert_eq!(
            layout.miner_chaindata_dir(1),
            PathBuf::from("/tmp/mc-test/miners/1/geth/chaindata")
        );
        assert_eq!(layout.wallet_enc_path(), PathBuf::from("/tmp/mc-test/wallet.enc"));
        assert_eq!(layout.app_log_path(), PathBuf::from("/tmp/mc-test/logs/app.log"));
    }

    #[test]
    fn test_binary_name_matches_host() {
        let layout = Layout::new("/tmp/mc-test");
        let name = layout.geth_binary_path();
        if cfg!(windows) {
            assert!(name.ends_with("bin/geth.exe") || name.ends_with("bin\\geth.exe"));
        } else {
            assert!(name.ends_with("bin/geth"));
        }
    }

    #[test]
    fn test_separate_miners_share_nothing() {
        let layout = Layout::new("/tmp/mc-test");
        let a = layout.miner_data_dir(1);
        let b = layout.miner_data_dir(2);
        assert_ne!(a, b);
        assert!(!b.starts_with(&a));
    }
}
