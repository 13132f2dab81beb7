//! Shared foundation for the Mars Credit miner supervisor.
//!
//! Everything here is host-level plumbing: platform detection, the
//! deterministic on-disk layout under `~/.marscredit`, per-miner port
//! allocation, PID files and logging bootstrap. No component in this
//! crate talks to Geth.

pub mod logging;
pub mod paths;
pub mod pid;
pub mod platform;
pub mod ports;

pub use paths::Layout;
pub use platform::PlatformKey;
pub use ports::Ports;
