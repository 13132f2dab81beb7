//! Multi-instance Geth supervisor.
//!
//! A [`service::MinerService`] is a registry of [`instance::MinerInstance`]s
//! keyed by a 1-based tab index. Each instance owns one child Geth
//! process, its ports, its log stream, a PID file and a periodic RPC
//! health probe. Observations fan out as [`events::MinerEvent`]s over a
//! broadcast channel; there is no listener registry and no global
//! supervisor singleton — the service value is threaded explicitly and
//! the host registers its own signal handling against it.

pub mod config;
pub mod events;
pub mod health;
pub mod instance;
pub mod service;

pub use config::{MinerConfig, MinerConfigPatch};
pub use events::{LogStream, MinerEvent, MinerState};
pub use instance::MinerInstance;
pub use service::MinerService;
