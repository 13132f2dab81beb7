//! Periodic RPC liveness probe.
//!
//! A wedged child can hold its ports without serving RPC; after enough
//! consecutive probe failures the instance stops itself so the tab can
//! be restarted cleanly. Transient startup failures are absorbed by the
//! counter, and the threshold is doubled during the first minute after
//! start while Geth is still opening its endpoints.

use std::sync::Arc;
use std::time::Duration;

use mars_rpc::RpcClient;
use tokio::time::Instant;

use crate::instance::MinerInstance;

pub const PROBE_INTERVAL: Duration = Duration::from_secs(5);
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;
pub const STARTUP_GRACE: Duration = Duration::from_secs(60);

pub(crate) async fn health_loop(instance: Arc<MinerInstance>) {
    let index = instance.miner_index();
    let client = RpcClient::new(&instance.rpc_url());
    let started = Instant::now();
    let mut failures: u32 = 0;

    loop {
        tokio::time::sleep(PROBE_INTERVAL).await;

        match client.net_version().await {
            Ok(_) => {
                if failures > 0 {
                    log::debug!("Miner {} health probe recovered", index);
                }
                failures = 0;
            }
            Err(err) => {
                failures += 1;
                let threshold = if started.elapsed() < STARTUP_GRACE {
                    MAX_CONSECUTIVE_FAILURES * 2
                } else {
                    MAX_CONSECUTIVE_FAILURES
                };
                log::debug!(
                    "Miner {} health probe failed ({}/{}): {}",
                    index,
                    failures,
                    threshold,
                    err
                );
                if failures >= threshold {
                    log::warn!(
                        "Miner {} unresponsive after {} consecutive probes, stopping it",
                        index,
                        failures
                    );
                    if let Err(err) = instance.stop().await {
                        log::error!("Miner {} health-driven stop failed: {}", index, err);
                    }
                    return;
                }
            }
        }
    }
}
