//! Known peer addresses.

use std::net::{SocketAddr, ToSocketAddrs};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::GossipError;

/// Peers in the order they were learned. Never contains the local address.
#[derive(Debug)]
pub struct PeerSet {
    local_addr: SocketAddr,
    peers: Vec<SocketAddr>,
}

impl PeerSet {
    pub fn new(local_addr: SocketAddr) -> Self {
        Self {
            local_addr,
            peers: Vec::new(),
        }
    }

    /// Returns true if `addr` was new.
    pub fn insert(&mut self, addr: SocketAddr) -> bool {
        if addr == self.local_addr || self.peers.contains(&addr) {
            return false;
        }
        self.peers.push(addr);
        true
    }

    pub fn contains(&self, addr: &SocketAddr) -> bool {
        self.peers.contains(addr)
    }

    pub fn to_vec(&self) -> Vec<SocketAddr> {
        self.peers.clone()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Uniformly random peer not in `exclude`.
    pub fn choose<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        exclude: &[SocketAddr],
    ) -> Option<SocketAddr> {
        let candidates: Vec<SocketAddr> = self
            .peers
            .iter()
            .copied()
            .filter(|peer| !exclude.contains(peer))
            .collect();
        candidates.choose(rng).copied()
    }
}

/// Resolve `host:port` text to its first socket address.
pub fn resolve(address: &str) -> Result<SocketAddr, GossipError> {
    let mut resolved = address
        .to_socket_addrs()
        .map_err(|e| GossipError::AddressFormat {
            address: address.to_string(),
            reason: e.to_string(),
        })?;
    resolved.next().ok_or_else(|| GossipError::AddressFormat {
        address: address.to_string(),
        reason: "resolved to no address".to_string(),
    })
}
