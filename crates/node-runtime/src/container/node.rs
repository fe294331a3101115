//! # Swarm Node
//!
//! One gossip engine and one block log wired into a single node. This is the
//! surface the rest of the swarm software (flight control, target
//! assignment, the control plane) talks to.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use shared_types::{Block, BlockContent, GossipPacket, RouteEntry};
use sw_01_gossip::{
    GossipApi, GossipCallback, GossipConfig, GossipEngine, GossipError, Transport, UdpTransport,
};
use sw_02_consensus::ConsensusConfig;
use sw_03_block_log::{BlockLogApi, BlockLogResult, BlockLogService, CommitCallback};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::adapters::GossipBroadcaster;
use crate::container::NodeConfig;
use crate::error::{NodeError, NodeResult};

/// Block log whose consensus messages travel over `GossipEngine<T>`.
pub type NodeBlockLog<T> = BlockLogService<GossipBroadcaster<GossipEngine<T>>>;

pub struct SwarmNode<T: Transport> {
    gossip: Arc<GossipEngine<T>>,
    block_log: Arc<NodeBlockLog<T>>,
    /// Number of committed blocks.
    committed: watch::Receiver<u64>,
}

impl<T: Transport> SwarmNode<T> {
    /// Wire a node on top of `transport`. Nothing runs until [`start`](Self::start).
    pub fn new(gossip_config: GossipConfig, consensus_config: ConsensusConfig, transport: T) -> Self {
        let gossip = Arc::new(GossipEngine::new(gossip_config, transport));
        let broadcaster = Arc::new(GossipBroadcaster::new(Arc::clone(&gossip)));
        let block_log = BlockLogService::new(consensus_config, broadcaster);

        let log = Arc::downgrade(&block_log);
        gossip.register_callback(Arc::new(move |origin: &str, packet: &GossipPacket| {
            let GossipPacket::Rumor(rumor) = packet else {
                return;
            };
            let Some(extra) = &rumor.extra else {
                return;
            };
            if let Some(log) = log.upgrade() {
                log.handle_message(origin, extra.clone());
            }
        }));

        let (committed_tx, committed) = watch::channel(0u64);
        block_log.on_commit(Arc::new(move |block: &Block| {
            committed_tx.send_replace(block.index + 1);
        }));

        Self {
            gossip,
            block_log,
            committed,
        }
    }

    /// Build from a validated [`NodeConfig`] and register its peers.
    pub fn from_config(config: &NodeConfig, transport: T) -> NodeResult<Self> {
        config.validate()?;
        let node = Self::new(config.to_gossip_config(), config.to_consensus_config(), transport);
        node.add_peers(&config.gossip.peers)?;
        Ok(node)
    }

    pub fn gossip(&self) -> &Arc<GossipEngine<T>> {
        &self.gossip
    }

    pub fn block_log(&self) -> &Arc<NodeBlockLog<T>> {
        &self.block_log
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    pub fn start(&self) -> NodeResult<()> {
        self.gossip.start()?;
        info!(identifier = %self.identifier(), address = %self.local_address(), "Swarm node started");
        Ok(())
    }

    /// Abandon any in-flight proposal, cancel every timer and stop receiving.
    pub async fn stop(&self) {
        self.block_log.stop();
        self.gossip.stop().await;
        info!(identifier = %self.identifier(), "Swarm node stopped");
    }

    // =========================================================================
    // GOSSIP
    // =========================================================================

    pub fn identifier(&self) -> &str {
        self.gossip.identifier()
    }

    pub fn local_address(&self) -> SocketAddr {
        self.gossip.local_address()
    }

    /// Broadcast `text` as the next local rumor; returns its id.
    pub fn submit(&self, text: &str) -> u32 {
        self.gossip.submit(text)
    }

    /// Send `data` to `destination` along the routing table.
    pub fn send_private(&self, destination: &str, data: Vec<u8>, hop_limit: u32) {
        self.gossip
            .send_private(self.identifier(), destination, data, hop_limit);
    }

    pub fn add_peers(&self, addresses: &[String]) -> Result<(), GossipError> {
        self.gossip.add_peers(addresses)
    }

    /// Called for every delivered rumor (consensus traffic included) and for
    /// private messages addressed here.
    pub fn register_callback(&self, callback: GossipCallback) {
        self.gossip.register_callback(callback);
    }

    pub fn peers(&self) -> Vec<SocketAddr> {
        self.gossip.peers()
    }

    pub fn routes(&self) -> HashMap<String, RouteEntry> {
        self.gossip.routes()
    }

    // =========================================================================
    // BLOCK LOG
    // =========================================================================

    /// Start agreement on a block holding `content` at the next index.
    pub fn propose(&self, content: BlockContent) -> BlockLogResult<Block> {
        self.block_log.propose(content)
    }

    /// Propose and wait until the index commits. The committed block may
    /// carry another node's content.
    pub async fn propose_and_wait(
        &self,
        content: BlockContent,
        timeout: Duration,
    ) -> NodeResult<Block> {
        let proposed = self.propose(content)?;
        let index = proposed.index;
        debug!(index, "waiting for commit");

        let timed_out = NodeError::CommitTimeout {
            index,
            timeout_ms: timeout.as_millis() as u64,
        };
        let mut committed = self.committed.clone();
        let reached = matches!(
            tokio::time::timeout(timeout, committed.wait_for(|len| *len > index)).await,
            Ok(Ok(_))
        );
        if !reached {
            return Err(timed_out);
        }

        self.block_log
            .blocks()
            .into_iter()
            .nth(index as usize)
            .ok_or(timed_out)
    }

    pub fn on_commit(&self, callback: CommitCallback) {
        self.block_log.on_commit(callback);
    }

    /// `(tail hash hex, blocks by hash hex)`.
    pub fn get_chain(&self) -> (String, HashMap<String, Block>) {
        self.block_log.get_chain()
    }

    /// Committed blocks from genesis to tail.
    pub fn blocks(&self) -> Vec<Block> {
        self.block_log.blocks()
    }
}

impl SwarmNode<UdpTransport> {
    /// Bind a UDP socket at `config.gossip.address` and wire a node on it.
    pub async fn bind(config: &NodeConfig) -> NodeResult<Self> {
        let transport = UdpTransport::bind(&config.gossip.address).await?;
        Self::from_config(config, transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use sw_01_gossip::MemoryNetwork;
    use sw_03_block_log::BlockLogError;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([10, 0, 0, 1], port))
    }

    fn single_node(network: &MemoryNetwork) -> SwarmNode<sw_01_gossip::MemoryTransport> {
        let transport = network.bind(addr(1)).unwrap();
        SwarmNode::new(
            GossipConfig::new("solo").with_anti_entropy(Duration::ZERO),
            ConsensusConfig::new(1, 0),
            transport,
        )
    }

    #[tokio::test]
    async fn test_single_node_commits_through_its_own_gossip() {
        let network = MemoryNetwork::new();
        let node = single_node(&network);
        node.start().unwrap();

        let first = node
            .propose_and_wait(BlockContent::text("alpha"), Duration::from_secs(2))
            .await
            .unwrap();
        let second = node
            .propose_and_wait(BlockContent::text("beta"), Duration::from_secs(2))
            .await
            .unwrap();

        assert!(first.is_genesis());
        assert_eq!(second.index, 1);
        assert_eq!(second.previous_hash, first.hash());
        assert_eq!(node.get_chain().0, second.hash_hex());
        node.stop().await;
    }

    #[tokio::test]
    async fn test_double_propose_is_rejected() {
        let network = MemoryNetwork::new();
        // Two participants: a lone node can never reach quorum.
        let transport = network.bind(addr(1)).unwrap();
        let node = SwarmNode::new(GossipConfig::new("A"), ConsensusConfig::new(2, 0), transport);
        node.start().unwrap();

        node.propose(BlockContent::text("a")).unwrap();
        assert_eq!(
            node.propose(BlockContent::text("b")),
            Err(BlockLogError::RoundInProgress { index: 0 })
        );
        node.stop().await;
    }

    #[tokio::test]
    async fn test_rumor_callback_sees_own_submission() {
        let network = MemoryNetwork::new();
        let node = single_node(&network);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        node.register_callback(Arc::new(move |origin: &str, packet: &GossipPacket| {
            if let GossipPacket::Rumor(rumor) = packet {
                sink.lock().push((origin.to_string(), rumor.text.clone()));
            }
        }));
        node.start().unwrap();

        assert_eq!(node.submit("hello"), 1);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(*seen.lock(), vec![("solo".to_string(), "hello".to_string())]);
        node.stop().await;
    }

    #[test]
    fn test_from_config_rejects_bad_peer() {
        let network = MemoryNetwork::new();
        let mut config = NodeConfig::default();
        config.gossip.peers = vec!["not-an-address".to_string()];
        let transport = network.bind(addr(1)).unwrap();

        let result = SwarmNode::from_config(&config, transport);
        assert!(matches!(
            result,
            Err(NodeError::Gossip(GossipError::AddressFormat { .. }))
        ));
    }

    #[test]
    fn test_from_config_rejects_invalid_consensus_section() {
        let network = MemoryNetwork::new();
        let mut config = NodeConfig::default();
        config.consensus.node_index = 1;
        let transport = network.bind(addr(1)).unwrap();

        assert!(matches!(
            SwarmNode::from_config(&config, transport),
            Err(NodeError::Config(_))
        ));
    }
}
