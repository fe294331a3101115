//! Inbound port: the gossip API offered to collaborators.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use shared_types::{ConsensusMessage, GossipPacket, RouteEntry};

use crate::error::GossipError;

/// Called with `(origin, packet)` for every newly delivered rumor and every
/// private message addressed to this node. Runs on the dispatcher task and
/// must not block.
pub type GossipCallback = Arc<dyn Fn(&str, &GossipPacket) + Send + Sync>;

/// Operations a collaborator may invoke on a running gossip node.
pub trait GossipApi: Send + Sync {
    fn identifier(&self) -> &str;

    fn local_address(&self) -> SocketAddr;

    /// Assign the next local id to `text` and disseminate it.
    fn submit(&self, text: &str) -> u32;

    /// Same as [`submit`](Self::submit) for a consensus sub-message.
    fn submit_extra(&self, extra: ConsensusMessage) -> u32;

    /// Relay `data` hop by hop towards `destination`.
    fn send_private(&self, origin: &str, destination: &str, data: Vec<u8>, hop_limit: u32);

    /// Register peers in order. Stops at the first unparsable address;
    /// earlier entries stay registered. The local address is ignored.
    fn add_peers(&self, addresses: &[String]) -> Result<(), GossipError>;

    fn register_callback(&self, callback: GossipCallback);

    /// Known peer addresses in the order they were learned.
    fn peers(&self) -> Vec<SocketAddr>;

    fn routes(&self) -> HashMap<String, RouteEntry>;

    fn route_to(&self, destination: &str) -> Option<SocketAddr>;

    /// Destinations present in the routing table, sorted.
    fn direct_nodes(&self) -> Vec<String>;

    /// Set a route by hand. Returns false if `next_hop` is the local address.
    fn add_route(&self, destination: &str, next_hop: SocketAddr) -> bool;
}
