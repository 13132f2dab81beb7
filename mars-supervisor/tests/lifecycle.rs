//! End-to-end supervision scenarios against a stub geth.
//!
//! The stub is a shell script that chats on stdout and sleeps; chain
//! data directories are pre-created so no `init` run is needed. Unix
//! only, like the process plumbing it exercises.
#![cfg(unix)]

use std::path::Path;
use std::time::Duration;

use mars_common::Layout;
use mars_supervisor::{MinerConfigPatch, MinerEvent, MinerService};
use tokio::sync::broadcast;
use tokio::time::timeout;

const EVENT_DEADLINE: Duration = Duration::from_secs(10);

fn write_stub_geth(dir: &Path) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("geth-stub");
    std::fs::write(
        &path,
        "#!/bin/sh\necho \"stub geth starting\"\nwhile true; do\n  echo \"mining block\"\n  sleep 1\ndone\n",
    )
    .unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn stub_service(indices: &[u32]) -> (tempfile::TempDir, MinerService) {
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout::new(dir.path().join("root"));
    for &index in indices {
        std::fs::create_dir_all(layout.miner_chaindata_dir(index)).unwrap();
    }
    let stub = write_stub_geth(dir.path());
    let service = MinerService::new(layout);
    service.set_geth_path(stub);
    (dir, service)
}

async fn next_matching<F>(
    events: &mut broadcast::Receiver<MinerEvent>,
    mut pred: F,
) -> MinerEvent
where
    F: FnMut(&MinerEvent) -> bool,
{
    timeout(EVENT_DEADLINE, async {
        loop {
            match events.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) => continue,
                Err(err) => panic!("event stream closed: {}", err),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

#[tokio::test]
async fn test_single_miner_start_log_stop() {
    let (_dir, service) = stub_service(&[1]);
    let mut events = service.subscribe();

    assert_eq!(service.add_tab(None), 1);
    service
        .start_miner(
            1,
            Some(&MinerConfigPatch {
                etherbase: Some("0x000000000000000000000000000000000000dEaD".into()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

    // State with pid set arrives before any log line.
    let first = next_matching(&mut events, |e| e.miner_index() == 1).await;
    match first {
        MinerEvent::State(state) => {
            assert!(state.running);
            assert!(state.pid.is_some());
            assert_eq!(state.rpc_url, "http://localhost:8546");
        }
        other => panic!("expected initial state event, got {:?}", other),
    }
    assert!(service.layout().miner_pid_path(1).exists());

    let log = next_matching(&mut events, |e| matches!(e, MinerEvent::Log { .. })).await;
    match log {
        MinerEvent::Log { line, .. } => assert!(line.contains("stub geth") || line.contains("mining")),
        _ => unreachable!(),
    }

    service.stop_miner(1).await.unwrap();
    let state = service.get_miner_state(1).unwrap();
    assert!(!state.running);
    assert_eq!(state.pid, None);
    assert!(!service.layout().miner_pid_path(1).exists());

    // State(running=false) precedes the terminal Exited.
    let stop_state = next_matching(
        &mut events,
        |e| matches!(e, MinerEvent::State(s) if !s.running),
    )
    .await;
    drop(stop_state);
    next_matching(&mut events, |e| matches!(e, MinerEvent::Exited { .. })).await;
}

#[tokio::test]
async fn test_two_concurrent_miners_are_isolated() {
    let (_dir, service) = stub_service(&[1, 2]);

    assert_eq!(service.add_tab(None), 1);
    assert_eq!(service.add_tab(None), 2);
    service.start_miner(1, None).await.unwrap();
    service.start_miner(2, None).await.unwrap();

    assert_eq!(service.get_rpc_url(1).as_deref(), Some("http://localhost:8546"));
    assert_eq!(service.get_rpc_url(2).as_deref(), Some("http://localhost:8548"));

    let one = service.get_miner_state(1).unwrap();
    let two = service.get_miner_state(2).unwrap();
    assert!(one.running && two.running);
    assert_ne!(one.pid, two.pid);

    // Each instance owns its own files.
    assert!(service.layout().miner_pid_path(1).exists());
    assert!(service.layout().miner_pid_path(2).exists());
    assert_ne!(
        service.layout().miner_data_dir(1),
        service.layout().miner_data_dir(2)
    );

    service.stop_all().await;
    assert!(service.get_running_miner_indices().is_empty());
}

#[tokio::test]
async fn test_sleep_wake_round_trip() {
    let (_dir, service) = stub_service(&[1, 2]);
    service.add_tab(None);
    service.add_tab(None);
    service.start_miner(1, None).await.unwrap();
    service.start_miner(2, None).await.unwrap();

    // Suspend: snapshot and stop everything.
    let snapshot = service.get_running_miner_indices();
    assert_eq!(snapshot, vec![1, 2]);
    service.stop_all().await;
    assert!(service.get_running_miner_indices().is_empty());
    assert!(!service.layout().miner_pid_path(1).exists());

    // Resume: replay the snapshot.
    for index in snapshot {
        service.start_miner(index, None).await.unwrap();
    }
    assert_eq!(service.get_running_miner_indices(), vec![1, 2]);
    assert_eq!(service.get_rpc_url(1).as_deref(), Some("http://localhost:8546"));
    assert_eq!(service.get_rpc_url(2).as_deref(), Some("http://localhost:8548"));

    service.stop_all().await;
}

#[tokio::test]
async fn test_double_start_is_refused() {
    let (_dir, service) = stub_service(&[1]);
    service.add_tab(None);
    service.start_miner(1, None).await.unwrap();
    assert!(service.start_miner(1, None).await.is_err());
    // Still running after the refused second start.
    assert!(service.get_miner_state(1).unwrap().running);
    service.stop_all().await;
}

#[tokio::test]
async fn test_stop_is_idempotent_and_restartable() {
    let (_dir, service) = stub_service(&[1]);
    service.add_tab(None);
    service.start_miner(1, None).await.unwrap();
    let first_pid = service.get_miner_state(1).unwrap().pid;

    service.stop_miner(1).await.unwrap();
    service.stop_miner(1).await.unwrap();
    assert!(!service.get_miner_state(1).unwrap().running);

    // An exited instance can be started again on the same ports.
    service.start_miner(1, None).await.unwrap();
    let state = service.get_miner_state(1).unwrap();
    assert!(state.running);
    assert_ne!(state.pid, first_pid);
    assert_eq!(state.rpc_url, "http://localhost:8546");
    service.stop_all().await;
}

// Takes ~30 s of wall clock: the stub serves no RPC, so the health
// probe (doubled threshold inside the startup grace) stops the miner
// on its own.
#[tokio::test]
#[ignore]
async fn test_health_probe_stops_unresponsive_miner() {
    let (_dir, service) = stub_service(&[1]);
    let mut events = service.subscribe();
    service.add_tab(None);
    service.start_miner(1, None).await.unwrap();

    let exited = timeout(Duration::from_secs(45), async {
        loop {
            match events.recv().await {
                Ok(MinerEvent::Exited { miner_index, .. }) if miner_index == 1 => return,
                Ok(_) => continue,
                Err(err) => panic!("event stream closed: {}", err),
            }
        }
    })
    .await;
    assert!(exited.is_ok(), "health checker never stopped the miner");
    assert!(!service.get_miner_state(1).unwrap().running);
    assert!(!service.layout().miner_pid_path(1).exists());
}
