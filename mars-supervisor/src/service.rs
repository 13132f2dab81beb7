//! Registry and broadcast hub for miner instances.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tokio::sync::broadcast;

use mars_common::Layout;

use crate::config::{MinerConfig, MinerConfigPatch};
use crate::events::{MinerEvent, MinerState};
use crate::instance::MinerInstance;

const EVENT_CAPACITY: usize = 1024;

/// Registry of miner instances keyed by a 1-based tab index.
///
/// Indices are allocated max+1 and never recycled within a session, so
/// a removed tab's ports stay parked. The service keeps a config cache
/// per index: a stopped tab remembers its threads, cache size and
/// etherbase across restarts.
pub struct MinerService {
    layout: Layout,
    geth_path: Mutex<PathBuf>,
    instances: Mutex<BTreeMap<u32, Arc<MinerInstance>>>,
    config_cache: Mutex<BTreeMap<u32, MinerConfig>>,
    next_index: Mutex<u32>,
    events: broadcast::Sender<MinerEvent>,
}

impl MinerService {
    pub fn new(layout: Layout) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let geth_path = layout.geth_binary_path();
        Self {
            layout,
            geth_path: Mutex::new(geth_path),
            instances: Mutex::new(BTreeMap::new()),
            config_cache: Mutex::new(BTreeMap::new()),
            next_index: Mutex::new(1),
            events,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Subscribe to the per-instance `Log`/`State`/`Exited` stream.
    pub fn subscribe(&self) -> broadcast::Receiver<MinerEvent> {
        self.events.subscribe()
    }

    /// Default binary for instances created after this call.
    pub fn set_geth_path(&self, path: PathBuf) {
        *self.geth_path.lock().unwrap() = path;
    }

    fn default_config(&self) -> MinerConfig {
        MinerConfig::new(self.geth_path.lock().unwrap().clone())
    }

    /// Allocate the next tab index and create (but do not start) its
    /// instance.
    pub fn add_tab(&self, patch: Option<&MinerConfigPatch>) -> u32 {
        let mut instances = self.instances.lock().unwrap();
        let mut next = self.next_index.lock().unwrap();
        let index = (*next).max(instances.keys().max().map_or(1, |max| max + 1));
        *next = index + 1;

        let mut config = self.default_config();
        if let Some(patch) = patch {
            config.apply(patch);
        }

        let instance =
            MinerInstance::new(index, self.layout.clone(), config.clone(), self.events.clone());
        instances.insert(index, instance);
        self.config_cache.lock().unwrap().insert(index, config);

        log::info!("Added miner tab {}", index);
        index
    }

    fn get_or_create(&self, index: u32) -> Arc<MinerInstance> {
        let mut instances = self.instances.lock().unwrap();
        if let Some(existing) = instances.get(&index) {
            return existing.clone();
        }

        let config = self
            .config_cache
            .lock()
            .unwrap()
            .get(&index)
            .cloned()
            .unwrap_or_else(|| self.default_config());
        let instance =
            MinerInstance::new(index, self.layout.clone(), config, self.events.clone());
        instances.insert(index, instance.clone());

        let mut next = self.next_index.lock().unwrap();
        if index >= *next {
            *next = index + 1;
        }
        instance
    }

    /// Start a miner, creating its instance on demand and merging any
    /// config on top of what the tab remembers.
    pub async fn start_miner(&self, index: u32, patch: Option<&MinerConfigPatch>) -> Result<()> {
        let instance = self.get_or_create(index);
        if let Some(patch) = patch {
            instance.update_config(patch);
        }
        self.config_cache
            .lock()
            .unwrap()
            .insert(index, instance.config());
        instance.start().await
    }

    /// Idempotent stop; always acknowledged with a `State` event.
    pub async fn stop_miner(&self, index: u32) -> Result<()> {
        let instance = { self.instances.lock().unwrap().get(&index).cloned() };
        let Some(instance) = instance else {
            return Ok(());
        };
        let was_running = instance.stop().await?;
        if !was_running {
            // The running path already broadcast its transition.
            let _ = self.events.send(MinerEvent::State(instance.state()));
        }
        Ok(())
    }

    /// Stop (if running) and forget a tab. Its index is not reused.
    pub async fn remove_tab(&self, index: u32) -> Result<()> {
        let instance = { self.instances.lock().unwrap().remove(&index) };
        self.config_cache.lock().unwrap().remove(&index);
        if let Some(instance) = instance {
            instance.stop().await?;
            log::info!("Removed miner tab {}", index);
        }
        Ok(())
    }

    pub fn get_miner_state(&self, index: u32) -> Option<MinerState> {
        self.instances
            .lock()
            .unwrap()
            .get(&index)
            .map(|instance| instance.state())
    }

    pub fn get_tab_indices(&self) -> Vec<u32> {
        self.instances.lock().unwrap().keys().copied().collect()
    }

    pub fn get_rpc_url(&self, index: u32) -> Option<String> {
        self.instances
            .lock()
            .unwrap()
            .get(&index)
            .map(|instance| instance.rpc_url())
    }

    /// Indices with a running child; the suspend handler snapshots
    /// this before `stop_all` and replays it on resume.
    pub fn get_running_miner_indices(&self) -> Vec<u32> {
        self.instances
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, instance)| instance.running())
            .map(|(index, _)| *index)
            .collect()
    }

    /// Stop every instance. A failing stop never cancels the rest.
    pub async fn stop_all(&self) {
        let instances: Vec<_> = self.instances.lock().unwrap().values().cloned().collect();
        for instance in instances {
            let index = instance.miner_index();
            match instance.stop().await {
                Ok(true) => {}
                Ok(false) => {
                    let _ = self.events.send(MinerEvent::State(instance.state()));
                }
                Err(err) => log::error!("Failed to stop miner {}: {}", index, err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> (tempfile::TempDir, MinerService) {
        let dir = tempfile::tempdir().unwrap();
        let service = MinerService::new(Layout::new(dir.path()));
        (dir, service)
    }

    #[test]
    fn test_add_tab_allocates_sequentially() {
        let (_dir, service) = test_service();
        for expected in 1..=4u32 {
            assert_eq!(service.add_tab(None), expected);
        }
        assert_eq!(service.get_tab_indices(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_indices_are_not_recycled() {
        let (_dir, service) = test_service();
        assert_eq!(service.add_tab(None), 1);
        assert_eq!(service.add_tab(None), 2);
        service.remove_tab(2).await.unwrap();
        // The freed maximum is not handed out again.
        assert_eq!(service.add_tab(None), 3);
        assert_eq!(service.get_tab_indices(), vec![1, 3]);
    }

    #[test]
    fn test_states_carry_derived_ports() {
        let (_dir, service) = test_service();
        service.add_tab(None);
        service.add_tab(None);

        let one = service.get_miner_state(1).unwrap();
        let two = service.get_miner_state(2).unwrap();
        assert_eq!(one.rpc_url, "http://localhost:8546");
        assert_eq!(two.rpc_url, "http://localhost:8548");
        assert!(!one.running);
        assert_eq!(one.pid, None);

        assert_eq!(service.get_rpc_url(2).as_deref(), Some("http://localhost:8548"));
        assert_eq!(service.get_rpc_url(9), None);
        assert!(service.get_miner_state(9).is_none());
    }

    #[test]
    fn test_add_tab_applies_config() {
        let (_dir, service) = test_service();
        let index = service.add_tab(Some(&MinerConfigPatch {
            miner_threads: Some(3),
            etherbase: Some("0x000000000000000000000000000000000000dEaD".into()),
            ..Default::default()
        }));
        let instance = service.get_or_create(index);
        let config = instance.config();
        assert_eq!(config.miner_threads, 3);
        assert!(config.etherbase.is_some());
    }

    #[test]
    fn test_set_geth_path_applies_to_new_tabs() {
        let (_dir, service) = test_service();
        let first = service.get_or_create(service.add_tab(None));
        service.set_geth_path(PathBuf::from("/opt/custom/geth"));
        let second = service.get_or_create(service.add_tab(None));

        assert_ne!(
            first.config().geth_binary_path,
            PathBuf::from("/opt/custom/geth")
        );
        assert_eq!(
            second.config().geth_binary_path,
            PathBuf::from("/opt/custom/geth")
        );
    }

    #[tokio::test]
    async fn test_stop_miner_on_unknown_tab_is_ok() {
        let (_dir, service) = test_service();
        service.stop_miner(42).await.unwrap();
    }

    #[tokio::test]
    async fn test_stopped_tab_acknowledges_with_state_event() {
        let (_dir, service) = test_service();
        let index = service.add_tab(None);
        let mut events = service.subscribe();

        service.stop_miner(index).await.unwrap();
        let event = events.try_recv().unwrap();
        match event {
            MinerEvent::State(state) => {
                assert_eq!(state.miner_index, index);
                assert!(!state.running);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_direct_start_index_blocks_reallocation() {
        let (_dir, service) = test_service();
        // Starting tab 5 directly must keep add_tab from reusing 1..=5.
        let _ = service.get_or_create(5);
        assert_eq!(service.add_tab(None), 6);
    }

    #[test]
    fn test_config_cache_survives_instance_recreation() {
        let (_dir, service) = test_service();
        let index = service.add_tab(Some(&MinerConfigPatch {
            cache_mb: Some(2048),
            ..Default::default()
        }));
        // Drop the instance but keep the cache entry.
        service.instances.lock().unwrap().remove(&index);
        let recreated = service.get_or_create(index);
        assert_eq!(recreated.config().cache_mb, 2048);
    }
}
