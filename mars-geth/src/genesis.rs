//! Per-miner chain data initialization from the fixed genesis.

use std::path::{Path, PathBuf};

use mars_common::Layout;
use tokio::process::Command;

use crate::error::GethError;

/// The Mars Credit genesis, byte-identical across installs. Chain id
/// 110110, Ethash, zero allocation, PoW hard-fork overrides at block 0.
pub const GENESIS_JSON: &str = include_str!("genesis.json");

/// Resolve the genesis file to hand to `geth init`.
///
/// An explicit override wins; otherwise a previously materialized
/// `<root>/genesis.json` is reused; otherwise the embedded copy is
/// written there first.
pub fn resolve_genesis(layout: &Layout, override_path: Option<&Path>) -> Result<PathBuf, GethError> {
    if let Some(path) = override_path {
        if !path.exists() {
            return Err(GethError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("genesis file not found: {}", path.display()),
            )));
        }
        return Ok(path.to_path_buf());
    }

    let materialized = layout.genesis_path();
    if !materialized.exists() {
        std::fs::create_dir_all(layout.root())?;
        std::fs::write(&materialized, GENESIS_JSON)?;
        log::info!("Wrote genesis file to {}", materialized.display());
    }
    Ok(materialized)
}

/// Ensure a miner's data directory exists and is initialized.
///
/// Idempotent: when `geth/chaindata` is already present the previously
/// synced chain data is left untouched and no process is spawned.
pub async fn init_miner_data_dir(
    geth_binary: &Path,
    layout: &Layout,
    miner_index: u32,
    genesis_override: Option<&Path>,
) -> Result<(), GethError> {
    let data_dir = layout.miner_data_dir(miner_index);

    if layout.miner_chaindata_dir(miner_index).exists() {
        log::debug!("Miner {} chain data already initialized, skipping init", miner_index);
        return Ok(());
    }

    std::fs::create_dir_all(&data_dir)?;
    std::fs::create_dir_all(layout.miner_keystore_dir(miner_index))?;
    std::fs::create_dir_all(layout.miner_logs_dir(miner_index))?;

    let genesis = resolve_genesis(layout, genesis_override)?;

    log::info!(
        "Initializing miner {} data dir from {}",
        miner_index,
        genesis.display()
    );

    let output = Command::new(geth_binary)
        .arg("--datadir")
        .arg(&data_dir)
        .arg("init")
        .arg(&genesis)
        .output()
        .await?;

    if !output.status.success() {
        return Err(GethError::GenesisInitFailed {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_genesis_shape() {
        // The genesis must pin the chain id and carry no premine.
        assert!(GENESIS_JSON.contains("\"chainId\": 110110"));
        assert!(GENESIS_JSON.contains("\"ethash\": {}"));
        assert!(GENESIS_JSON.contains("\"alloc\": {}"));
    }

    #[test]
    fn test_resolve_materializes_embedded_genesis() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());

        let path = resolve_genesis(&layout, None).unwrap();
        assert_eq!(path, layout.genesis_path());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), GENESIS_JSON);

        // A second resolve reuses the file.
        let again = resolve_genesis(&layout, None).unwrap();
        assert_eq!(again, path);
    }

    #[test]
    fn test_resolve_missing_override_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let missing = dir.path().join("nope.json");
        assert!(resolve_genesis(&layout, Some(&missing)).is_err());
    }

    #[tokio::test]
    async fn test_init_is_a_noop_when_chaindata_exists() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        std::fs::create_dir_all(layout.miner_chaindata_dir(1)).unwrap();

        // The binary path is bogus; if init tried to spawn it, this
        // would fail.
        let bogus = dir.path().join("no-such-geth");
        init_miner_data_dir(&bogus, &layout, 1, None).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_init_creates_layout_and_runs_geth() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());

        let stub = dir.path().join("geth-stub");
        std::fs::write(&stub, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();

        init_miner_data_dir(&stub, &layout, 2, None).await.unwrap();

        assert!(layout.miner_data_dir(2).is_dir());
        assert!(layout.miner_keystore_dir(2).is_dir());
        assert!(layout.miner_logs_dir(2).is_dir());
        assert!(layout.genesis_path().exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_init_failure_carries_output() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());

        let stub = dir.path().join("geth-stub");
        std::fs::write(&stub, "#!/bin/sh\necho boom >&2\nexit 1\n").unwrap();
        std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = init_miner_data_dir(&stub, &layout, 3, None).await.unwrap_err();
        match err {
            GethError::GenesisInitFailed { stderr, .. } => assert!(stderr.contains("boom")),
            other => panic!("unexpected error: {}", other),
        }
    }
}
