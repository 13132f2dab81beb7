//! A single supervised Geth child process.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{broadcast, Notify};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::timeout;

use mars_common::{pid as pidfile, Layout, Ports};
use mars_geth::{args, genesis};

use crate::config::{MinerConfig, MinerConfigPatch};
use crate::events::{LogStream, MinerEvent, MinerState};
use crate::health;

/// Grace period between the termination signal and the forced kill.
pub const STOP_GRACE: Duration = Duration::from_secs(5);

/// One miner tab: a fixed index, its derived port triple, and at most
/// one running child at any time.
pub struct MinerInstance {
    miner_index: u32,
    layout: Layout,
    ports: Ports,
    events: broadcast::Sender<MinerEvent>,
    config: Mutex<MinerConfig>,
    shared: Mutex<Shared>,
    // Serializes start/stop; holds the handles of the current run.
    run: tokio::sync::Mutex<Option<RunHandle>>,
    weak_self: Weak<MinerInstance>,
}

#[derive(Default)]
struct Shared {
    running: bool,
    pid: Option<u32>,
}

struct RunHandle {
    shutdown: Arc<Notify>,
    health: JoinHandle<()>,
    supervise: JoinHandle<()>,
}

impl MinerInstance {
    pub fn new(
        miner_index: u32,
        layout: Layout,
        config: MinerConfig,
        events: broadcast::Sender<MinerEvent>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            miner_index,
            ports: Ports::for_index(miner_index),
            layout,
            events,
            config: Mutex::new(config),
            shared: Mutex::new(Shared::default()),
            run: tokio::sync::Mutex::new(None),
            weak_self: weak.clone(),
        })
    }

    pub fn miner_index(&self) -> u32 {
        self.miner_index
    }

    pub fn http_port(&self) -> u16 {
        self.ports.http
    }

    pub fn rpc_url(&self) -> String {
        self.ports.rpc_url()
    }

    pub fn running(&self) -> bool {
        self.shared.lock().unwrap().running
    }

    pub fn pid(&self) -> Option<u32> {
        self.shared.lock().unwrap().pid
    }

    pub fn state(&self) -> MinerState {
        let shared = self.shared.lock().unwrap();
        MinerState {
            miner_index: self.miner_index,
            running: shared.running,
            pid: shared.pid,
            rpc_url: self.rpc_url(),
        }
    }

    pub fn config(&self) -> MinerConfig {
        self.config.lock().unwrap().clone()
    }

    pub fn update_config(&self, patch: &MinerConfigPatch) {
        self.config.lock().unwrap().apply(patch);
    }

    /// Start the child. Fails when a process is already owned, when a
    /// live foreign Geth holds this tab's PID file, or when genesis
    /// initialization or the spawn itself fails; none of those leave
    /// state behind.
    pub async fn start(&self) -> Result<()> {
        let mut run = self.run.lock().await;
        if self.shared.lock().unwrap().running {
            bail!("Miner {} is already running", self.miner_index);
        }

        let pid_path = self.layout.miner_pid_path(self.miner_index);
        if let Ok(Some(old_pid)) = pidfile::read_pid_file(&pid_path) {
            if pidfile::is_process_alive(old_pid) {
                bail!(
                    "Miner {} already has a live geth (PID {}) outside this supervisor",
                    self.miner_index,
                    old_pid
                );
            }
            log::warn!(
                "Overwriting stale PID file for miner {} (PID {} not running)",
                self.miner_index,
                old_pid
            );
        }

        let config = self.config();

        genesis::init_miner_data_dir(&config.geth_binary_path, &self.layout, self.miner_index, None)
            .await
            .with_context(|| format!("Genesis init failed for miner {}", self.miner_index))?;

        std::fs::create_dir_all(self.layout.miner_logs_dir(self.miner_index))
            .context("Failed to create miner logs directory")?;

        let argv = args::mining_args(
            &self.layout.miner_data_dir(self.miner_index),
            &self.layout.miner_keystore_dir(self.miner_index),
            self.ports,
            config.miner_threads,
            config.cache_mb,
            config.etherbase.as_deref(),
        );

        log::info!(
            "Starting miner {} on {} (threads: {}, cache: {} MB)",
            self.miner_index,
            self.rpc_url(),
            config.miner_threads,
            config.cache_mb
        );
        log::debug!("geth argv: {}", argv.join(" "));

        let mut command = Command::new(&config.geth_binary_path);
        command
            .args(&argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(unix)]
        unsafe {
            // Own session: supervisor exit must not take a running
            // miner down with it mid-operation.
            command.pre_exec(|| {
                let _ = nix::unistd::setsid();
                Ok(())
            });
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to spawn geth for miner {}", self.miner_index))?;
        let pid = child.id().context("Spawned geth reported no PID")?;

        pidfile::write_pid_file(&pid_path, pid)?;
        {
            let mut shared = self.shared.lock().unwrap();
            shared.running = true;
            shared.pid = Some(pid);
        }
        // The transition is complete before anyone can observe a log.
        let _ = self.events.send(MinerEvent::State(self.state()));

        let stdout = child.stdout.take().context("child stdout was not piped")?;
        let stderr = child.stderr.take().context("child stderr was not piped")?;
        let log_file = self.layout.miner_log_file(self.miner_index);
        tokio::spawn(pump_logs(
            self.miner_index,
            LogStream::Stdout,
            stdout,
            log_file.clone(),
            self.events.clone(),
        ));
        tokio::spawn(pump_logs(
            self.miner_index,
            LogStream::Stderr,
            stderr,
            log_file,
            self.events.clone(),
        ));

        let instance = self
            .weak_self
            .upgrade()
            .context("Instance dropped during start")?;
        let health = tokio::spawn(health::health_loop(instance.clone()));
        let health_abort = health.abort_handle();

        let shutdown = Arc::new(Notify::new());
        let supervise = tokio::spawn(supervise(instance, child, shutdown.clone(), health_abort));

        *run = Some(RunHandle {
            shutdown,
            health,
            supervise,
        });
        Ok(())
    }

    /// Cooperative, idempotent stop.
    ///
    /// The health checker and the PID file are released immediately;
    /// the child gets the graceful signal and a forced kill after
    /// [`STOP_GRACE`] if it has not exited. Returns once the exit has
    /// been observed and broadcast; the value says whether there was a
    /// run to tear down.
    pub async fn stop(&self) -> Result<bool> {
        let mut run = self.run.lock().await;
        let Some(handle) = run.take() else {
            return Ok(false);
        };

        log::info!("Stopping miner {}", self.miner_index);
        handle.health.abort();
        let _ = pidfile::remove_pid_file(&self.layout.miner_pid_path(self.miner_index));

        handle.shutdown.notify_one();
        if let Err(err) = handle.supervise.await {
            log::warn!("Miner {} supervision task failed: {}", self.miner_index, err);
        }
        Ok(true)
    }
}

/// Waits for the child to exit, naturally or on request, then clears
/// owned state and broadcasts the final `State` and `Exited` events.
async fn supervise(
    instance: Arc<MinerInstance>,
    mut child: Child,
    shutdown: Arc<Notify>,
    health: AbortHandle,
) {
    let status = tokio::select! {
        status = child.wait() => status,
        _ = shutdown.notified() => terminate_gracefully(&mut child).await,
    };
    health.abort();

    let index = instance.miner_index;
    if let Err(err) = pidfile::remove_pid_file(&instance.layout.miner_pid_path(index)) {
        log::warn!("Miner {}: {}", index, err);
    }

    {
        let mut shared = instance.shared.lock().unwrap();
        shared.running = false;
        shared.pid = None;
    }

    let (code, signal) = match status {
        Ok(status) => (status.code(), exit_signal(&status)),
        Err(err) => {
            log::warn!("Miner {}: waiting on child failed: {}", index, err);
            (None, None)
        }
    };
    log::info!("Miner {} exited (code: {:?}, signal: {:?})", index, code, signal);

    let _ = instance.events.send(MinerEvent::State(instance.state()));
    let _ = instance.events.send(MinerEvent::Exited {
        miner_index: index,
        code,
        signal,
    });
}

async fn terminate_gracefully(child: &mut Child) -> std::io::Result<std::process::ExitStatus> {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
    }

    #[cfg(not(unix))]
    if let Some(pid) = child.id() {
        // Best-effort graceful on Windows; escalation below is the
        // same 5 s deadline as Unix.
        let _ = Command::new("taskkill")
            .args(["/PID", &pid.to_string()])
            .output()
            .await;
    }

    match timeout(STOP_GRACE, child.wait()).await {
        Ok(status) => status,
        Err(_) => {
            log::warn!("Child did not exit within {:?}, force killing", STOP_GRACE);
            let _ = child.start_kill();
            child.wait().await
        }
    }
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

/// Split one child pipe into non-empty lines, mirror them into the
/// miner's log file and broadcast each as a `Log` event.
async fn pump_logs<R>(
    miner_index: u32,
    stream: LogStream,
    reader: R,
    log_path: PathBuf,
    events: broadcast::Sender<MinerEvent>,
) where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    let mut sink = match tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .await
    {
        Ok(file) => Some(file),
        Err(err) => {
            log::warn!(
                "Miner {}: cannot open {} for log capture: {}",
                miner_index,
                log_path.display(),
                err
            );
            None
        }
    };

    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                if let Some(file) = sink.as_mut() {
                    let _ = file.write_all(line.as_bytes()).await;
                    let _ = file.write_all(b"\n").await;
                }
                let _ = events.send(MinerEvent::Log {
                    miner_index,
                    stream,
                    line,
                    timestamp: chrono::Utc::now(),
                });
            }
            Ok(None) => break,
            Err(err) => {
                log::debug!("Miner {} {} reader closed: {}", miner_index, stream, err);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_instance() -> Arc<MinerInstance> {
        let (events, _) = broadcast::channel(16);
        MinerInstance::new(
            3,
            Layout::new("/tmp/mc-instance-test"),
            MinerConfig::new(PathBuf::from("/no/such/geth")),
            events,
        )
    }

    #[test]
    fn test_created_instance_holds_only_config() {
        let instance = test_instance();
        assert!(!instance.running());
        assert_eq!(instance.pid(), None);
        assert_eq!(instance.http_port(), 8550);
        assert_eq!(instance.rpc_url(), "http://localhost:8550");
    }

    #[test]
    fn test_state_snapshot() {
        let instance = test_instance();
        let state = instance.state();
        assert_eq!(state.miner_index, 3);
        assert!(!state.running);
        assert_eq!(state.pid, None);
        assert_eq!(state.rpc_url, "http://localhost:8550");
    }

    #[test]
    fn test_update_config_merges() {
        let instance = test_instance();
        instance.update_config(&MinerConfigPatch {
            etherbase: Some("0x000000000000000000000000000000000000dEaD".into()),
            ..Default::default()
        });
        let config = instance.config();
        assert_eq!(config.miner_threads, 1);
        assert_eq!(
            config.etherbase.as_deref(),
            Some("0x000000000000000000000000000000000000dEaD")
        );
    }

    #[tokio::test]
    async fn test_stop_without_start_is_idempotent() {
        let instance = test_instance();
        instance.stop().await.unwrap();
        instance.stop().await.unwrap();
        assert!(!instance.running());
    }

    #[tokio::test]
    async fn test_start_with_missing_binary_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let (events, _) = broadcast::channel(16);
        let layout = Layout::new(dir.path());
        // Chain data present, so start goes straight to the spawn.
        std::fs::create_dir_all(layout.miner_chaindata_dir(1)).unwrap();
        let instance = MinerInstance::new(
            1,
            layout.clone(),
            MinerConfig::new(dir.path().join("no-such-geth")),
            events,
        );

        assert!(instance.start().await.is_err());
        assert!(!instance.running());
        assert_eq!(instance.pid(), None);
        assert!(!layout.miner_pid_path(1).exists());
    }
}
