//! # Swarm Launcher
//!
//! Starts N nodes in one process, named `A`, `B`, `C`... and peered
//! according to a [`Topology`]. Used by the simulator and by the
//! multi-node integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use sw_01_gossip::{
    GossipConfig, MemoryNetwork, MemoryTransport, Transport, TransportError, UdpTransport,
};
use sw_02_consensus::ConsensusConfig;
use tracing::info;

use crate::container::SwarmNode;
use crate::error::{NodeError, NodeResult};

/// Who peers with whom. Edges are symmetric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topology {
    /// Every node knows every other node.
    FullMesh,
    /// `0 ↔ 1 ↔ 2 ↔ ...`
    Line,
    /// Explicit undirected edges by node index.
    Edges(Vec<(usize, usize)>),
}

impl Topology {
    fn edges(&self, size: usize) -> Vec<(usize, usize)> {
        match self {
            Topology::FullMesh => (0..size)
                .flat_map(|a| (a + 1..size).map(move |b| (a, b)))
                .collect(),
            Topology::Line => (1..size).map(|b| (b - 1, b)).collect(),
            Topology::Edges(edges) => edges
                .iter()
                .copied()
                .filter(|&(a, b)| a != b && a < size && b < size)
                .collect(),
        }
    }
}

/// Launch parameters shared by every node of the swarm.
#[derive(Debug, Clone)]
pub struct SwarmOptions {
    pub size: usize,
    pub topology: Topology,
    pub base_port: u16,
    pub anti_entropy: Duration,
    pub route_timer: Duration,
    pub paxos_retry: u64,
    pub round_timeout: Duration,
}

impl Default for SwarmOptions {
    fn default() -> Self {
        Self {
            size: 3,
            topology: Topology::FullMesh,
            base_port: 5000,
            anti_entropy: Duration::from_secs(1),
            route_timer: Duration::ZERO,
            paxos_retry: 1,
            round_timeout: Duration::from_secs(1),
        }
    }
}

impl SwarmOptions {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    /// `base_port + index`, failing instead of wrapping past 65535.
    fn port(&self, index: usize) -> NodeResult<u16> {
        u16::try_from(index)
            .ok()
            .and_then(|offset| self.base_port.checked_add(offset))
            .ok_or(NodeError::PortRange {
                base_port: self.base_port,
                index,
            })
    }

    fn gossip_config(&self, index: usize) -> GossipConfig {
        GossipConfig::new(node_name(index))
            .with_anti_entropy(self.anti_entropy)
            .with_route_timer(self.route_timer)
    }

    fn consensus_config(&self, index: usize) -> ConsensusConfig {
        ConsensusConfig {
            paxos_retry: self.paxos_retry,
            round_timeout: self.round_timeout,
            ..ConsensusConfig::new(self.size, index as u32)
        }
    }
}

/// `A`..`Z`, then `N26`, `N27`...
pub fn node_name(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'A' + i).to_string(),
        _ => format!("N{index}"),
    }
}

pub struct Swarm<T: Transport> {
    nodes: Vec<SwarmNode<T>>,
}

impl<T: Transport> Swarm<T> {
    fn assemble(
        options: &SwarmOptions,
        mut bind: impl FnMut(usize) -> NodeResult<T>,
    ) -> NodeResult<Self> {
        let mut nodes = Vec::with_capacity(options.size);
        for index in 0..options.size {
            let transport = bind(index)?;
            nodes.push(SwarmNode::new(
                options.gossip_config(index),
                options.consensus_config(index),
                transport,
            ));
        }

        for (a, b) in options.topology.edges(options.size) {
            nodes[a].add_peers(&[nodes[b].local_address().to_string()])?;
            nodes[b].add_peers(&[nodes[a].local_address().to_string()])?;
        }
        Ok(Self { nodes })
    }

    pub fn start(&self) -> NodeResult<()> {
        for node in &self.nodes {
            node.start()?;
        }
        info!(size = self.nodes.len(), "Swarm started");
        Ok(())
    }

    pub async fn stop(&self) {
        for node in &self.nodes {
            node.stop().await;
        }
    }

    pub fn nodes(&self) -> &[SwarmNode<T>] {
        &self.nodes
    }

    /// Node at `index`, or `None` past the end of the swarm.
    pub fn node(&self, index: usize) -> Option<&SwarmNode<T>> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Swarm<MemoryTransport> {
    /// Nodes on an in-process network at `127.0.0.1:base_port + i`.
    pub fn in_memory(network: &MemoryNetwork, options: &SwarmOptions) -> NodeResult<Self> {
        Self::assemble(options, |index| {
            let addr = SocketAddr::from(([127, 0, 0, 1], options.port(index)?));
            Ok(network.bind(addr)?)
        })
    }
}

impl Swarm<UdpTransport> {
    /// Nodes on UDP sockets at `host:base_port + i`.
    pub async fn udp(host: &str, options: &SwarmOptions) -> NodeResult<Self> {
        let mut transports = Vec::with_capacity(options.size);
        for index in 0..options.size {
            let address = format!("{host}:{}", options.port(index)?);
            transports.push(UdpTransport::bind(&address).await?);
        }
        let mut transports = transports.into_iter();
        Self::assemble(options, |_| {
            transports
                .next()
                .ok_or(NodeError::Transport(TransportError::Closed))
        })
    }
}
