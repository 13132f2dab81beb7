pub mod balance;
pub mod block_number;
pub mod hashrate;
pub mod miner_start;
pub mod miner_stop;
pub mod mining;
pub mod peers;
pub mod set_etherbase;
pub mod syncing;

use clap::Args;
use mars_common::Ports;
use mars_rpc::RpcClient;

/// Endpoint selection shared by the RPC commands.
#[derive(Debug, Clone, Args)]
pub struct TargetOpts {
    /// Explicit JSON-RPC endpoint
    #[clap(long)]
    pub rpc_url: Option<String>,

    /// Use this miner tab's local endpoint
    #[clap(long, default_value = "1")]
    pub miner: u32,
}

impl TargetOpts {
    pub fn url(&self) -> String {
        self.rpc_url
            .clone()
            .unwrap_or_else(|| Ports::for_index(self.miner).rpc_url())
    }

    pub fn client(&self) -> RpcClient {
        RpcClient::new(&self.url())
    }
}
