//! Events fanned out by the supervisor.
//!
//! Per instance, a `State` with `running = true` precedes any `Log`
//! for that start, and `Exited` is the last event of the run. Across
//! instances no ordering is guaranteed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Stdout,
    Stderr,
}

impl fmt::Display for LogStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogStream::Stdout => f.write_str("stdout"),
            LogStream::Stderr => f.write_str("stderr"),
        }
    }
}

/// Observable state of one miner instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinerState {
    pub miner_index: u32,
    pub running: bool,
    pub pid: Option<u32>,
    pub rpc_url: String,
}

#[derive(Debug, Clone)]
pub enum MinerEvent {
    /// One non-empty line from the child's stdout or stderr.
    Log {
        miner_index: u32,
        stream: LogStream,
        line: String,
        timestamp: DateTime<Utc>,
    },
    /// A state transition; emitted after the transition is complete,
    /// so no observer sees `running = true` before the pid is set.
    State(MinerState),
    /// The child is gone; last event for a given start.
    Exited {
        miner_index: u32,
        code: Option<i32>,
        signal: Option<i32>,
    },
}

impl MinerEvent {
    pub fn miner_index(&self) -> u32 {
        match self {
            MinerEvent::Log { miner_index, .. } => *miner_index,
            MinerEvent::State(state) => state.miner_index,
            MinerEvent::Exited { miner_index, .. } => *miner_index,
        }
    }
}
