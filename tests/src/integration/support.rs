//! Shared fixtures for the integration scenarios.

use std::sync::Arc;
use std::time::Duration;

use node_runtime::{Swarm, SwarmOptions};
use parking_lot::Mutex;
use shared_types::GossipPacket;
use sw_01_gossip::{MemoryNetwork, MemoryTransport, Transport};
use tokio::time::Instant;

/// Poll `condition` every 10ms until it holds or `timeout` elapses.
pub async fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// `(origin, id, text)` of every plain rumor a node delivered, in order.
#[derive(Clone, Default)]
pub struct DeliveryLog {
    entries: Arc<Mutex<Vec<(String, u32, String)>>>,
}

impl DeliveryLog {
    /// Record plain rumors delivered by `node`; consensus traffic is skipped.
    pub fn attach<T: Transport>(node: &node_runtime::SwarmNode<T>) -> Self {
        let log = Self::default();
        let entries = Arc::clone(&log.entries);
        node.register_callback(Arc::new(move |origin: &str, packet: &GossipPacket| {
            if let GossipPacket::Rumor(rumor) = packet {
                if rumor.extra.is_none() {
                    entries
                        .lock()
                        .push((origin.to_string(), rumor.id, rumor.text.clone()));
                }
            }
        }));
        log
    }

    pub fn entries(&self) -> Vec<(String, u32, String)> {
        self.entries.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .map(|(_, _, text)| text.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Options with timers short enough for tests.
pub fn fast_options(size: usize) -> SwarmOptions {
    SwarmOptions {
        anti_entropy: Duration::from_millis(50),
        round_timeout: Duration::from_millis(200),
        ..SwarmOptions::new(size)
    }
}

/// Build an in-memory swarm, attach a delivery log to every node, start it.
pub fn launch(
    network: &MemoryNetwork,
    options: &SwarmOptions,
) -> (Swarm<MemoryTransport>, Vec<DeliveryLog>) {
    let swarm = match Swarm::in_memory(network, options) {
        Ok(swarm) => swarm,
        Err(e) => panic!("swarm setup failed: {e}"),
    };
    let logs = swarm.nodes().iter().map(DeliveryLog::attach).collect();
    if let Err(e) = swarm.start() {
        panic!("swarm start failed: {e}");
    }
    (swarm, logs)
}
