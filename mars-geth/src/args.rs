//! Mining argument vector composition.
//!
//! The flag surface and its ordering are fixed; every miner start
//! composes exactly this vector, varying only in paths, ports, thread
//! count, cache size and etherbase.

use std::path::Path;

use mars_common::Ports;

use crate::{BOOTNODES, NETWORK_ID};

const RPC_APIS: &str = "personal,eth,net,web3,miner,admin,debug";

/// Compose the full Geth argv for one mining instance.
pub fn mining_args(
    data_dir: &Path,
    keystore_dir: &Path,
    ports: Ports,
    miner_threads: u32,
    cache_mb: u32,
    etherbase: Option<&str>,
) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();

    args.push("--datadir".into());
    args.push(data_dir.to_string_lossy().into_owned());
    args.push("--keystore".into());
    args.push(keystore_dir.to_string_lossy().into_owned());

    args.push("--syncmode".into());
    args.push("full".into());
    args.push("--gcmode".into());
    args.push("full".into());

    args.push("--http".into());
    args.push("--http.addr".into());
    args.push("localhost".into());
    args.push("--http.port".into());
    args.push(ports.http.to_string());
    args.push("--http.api".into());
    args.push(RPC_APIS.into());
    args.push("--http.vhosts".into());
    args.push("*".into());
    args.push("--http.corsdomain".into());
    args.push("*".into());

    args.push("--ws".into());
    args.push("--ws.addr".into());
    args.push("localhost".into());
    args.push("--ws.port".into());
    args.push(ports.ws.to_string());
    args.push("--ws.api".into());
    args.push(RPC_APIS.into());

    args.push("--port".into());
    args.push(ports.p2p.to_string());
    args.push("--networkid".into());
    args.push(NETWORK_ID.to_string());
    args.push("--bootnodes".into());
    args.push(BOOTNODES.join(","));
    args.push("--nat".into());
    args.push("any".into());

    args.push("--mine".into());
    args.push("--miner.threads".into());
    args.push(miner_threads.to_string());

    args.push("--verbosity".into());
    args.push("3".into());
    args.push("--maxpeers".into());
    args.push("50".into());

    args.push("--cache".into());
    args.push(cache_mb.to_string());
    args.push("--cache.database".into());
    args.push("75".into());
    args.push("--cache.trie".into());
    args.push("25".into());
    args.push("--cache.gc".into());
    args.push("25".into());
    args.push("--cache.snapshot".into());
    args.push("10".into());

    args.push("--txpool.globalslots".into());
    args.push("8192".into());
    args.push("--txpool.globalqueue".into());
    args.push("2048".into());

    args.push("--nousb".into());
    args.push("--metrics".into());
    args.push("--allow-insecure-unlock".into());
    args.push("--snapshot".into());

    if let Some(etherbase) = etherbase {
        args.push("--miner.etherbase".into());
        args.push(etherbase.to_string());
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn argv(etherbase: Option<&str>) -> Vec<String> {
        mining_args(
            &PathBuf::from("/data/miners/1"),
            &PathBuf::from("/data/miners/1/keystore"),
            Ports::for_index(1),
            2,
            4096,
            etherbase,
        )
    }

    #[test]
    fn test_argv_prefix_order() {
        let args = argv(None);
        assert_eq!(
            &args[..8],
            &[
                "--datadir",
                "/data/miners/1",
                "--keystore",
                "/data/miners/1/keystore",
                "--syncmode",
                "full",
                "--gcmode",
                "full",
            ]
        );
    }

    #[test]
    fn test_ports_and_network_id() {
        let args = argv(None);
        let http = args.iter().position(|a| a == "--http.port").unwrap();
        assert_eq!(args[http + 1], "8546");
        let ws = args.iter().position(|a| a == "--ws.port").unwrap();
        assert_eq!(args[ws + 1], "8547");
        let p2p = args.iter().position(|a| a == "--port").unwrap();
        assert_eq!(args[p2p + 1], "30304");
        let net = args.iter().position(|a| a == "--networkid").unwrap();
        assert_eq!(args[net + 1], "110110");
    }

    #[test]
    fn test_bootnodes_are_comma_joined() {
        let args = argv(None);
        let at = args.iter().position(|a| a == "--bootnodes").unwrap();
        let joined = &args[at + 1];
        assert_eq!(joined.matches("enode://").count(), 4);
        assert_eq!(joined.matches(',').count(), 3);
    }

    #[test]
    fn test_etherbase_appended_iff_configured() {
        let without = argv(None);
        assert!(!without.iter().any(|a| a == "--miner.etherbase"));
        assert_eq!(without.last().unwrap(), "--snapshot");

        let addr = "0x000000000000000000000000000000000000dEaD";
        let with = argv(Some(addr));
        assert_eq!(&with[with.len() - 2..], &["--miner.etherbase".to_string(), addr.to_string()]);
        // Everything before the etherbase pair is unchanged.
        assert_eq!(&with[..with.len() - 2], &without[..]);
    }

    #[test]
    fn test_mining_flags() {
        let args = argv(None);
        assert!(args.iter().any(|a| a == "--mine"));
        let threads = args.iter().position(|a| a == "--miner.threads").unwrap();
        assert_eq!(args[threads + 1], "2");
        let cache = args.iter().position(|a| a == "--cache").unwrap();
        assert_eq!(args[cache + 1], "4096");
        let verbosity = args.iter().position(|a| a == "--verbosity").unwrap();
        assert_eq!(args[verbosity + 1], "3");
    }
}
