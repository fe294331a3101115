//! In-process datagram network.
//!
//! Endpoints bound on one [`MemoryNetwork`] exchange datagrams through
//! unbounded channels. Datagrams to unbound addresses vanish, as they would on
//! UDP. A drop filter can discard chosen datagrams to simulate loss.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::{mpsc, Mutex};
use tracing::trace;

use crate::ports::{Transport, TransportError};

/// Returns true for datagrams that must be dropped: `(from, to, payload)`.
pub type DropFilter = Arc<dyn Fn(SocketAddr, SocketAddr, &[u8]) -> bool + Send + Sync>;

type Datagram = (Vec<u8>, SocketAddr);

#[derive(Default)]
struct Hub {
    endpoints: RwLock<HashMap<SocketAddr, mpsc::UnboundedSender<Datagram>>>,
    filter: RwLock<Option<DropFilter>>,
}

/// Shared in-memory network; clones refer to the same hub.
#[derive(Clone, Default)]
pub struct MemoryNetwork {
    hub: Arc<Hub>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an endpoint at `addr`.
    pub fn bind(&self, addr: SocketAddr) -> Result<MemoryTransport, TransportError> {
        let mut endpoints = self.hub.endpoints.write();
        if endpoints.contains_key(&addr) {
            return Err(TransportError::AddrInUse(addr));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        endpoints.insert(addr, tx);
        Ok(MemoryTransport {
            local_addr: addr,
            hub: Arc::clone(&self.hub),
            inbox: Mutex::new(rx),
        })
    }

    pub fn set_drop_filter<F>(&self, filter: F)
    where
        F: Fn(SocketAddr, SocketAddr, &[u8]) -> bool + Send + Sync + 'static,
    {
        *self.hub.filter.write() = Some(Arc::new(filter));
    }

    pub fn clear_drop_filter(&self) {
        *self.hub.filter.write() = None;
    }

    pub fn is_bound(&self, addr: &SocketAddr) -> bool {
        self.hub.endpoints.read().contains_key(addr)
    }
}

/// One endpoint of a [`MemoryNetwork`]. Unbinds itself on drop.
pub struct MemoryTransport {
    local_addr: SocketAddr,
    hub: Arc<Hub>,
    inbox: Mutex<mpsc::UnboundedReceiver<Datagram>>,
}

#[async_trait]
impl Transport for MemoryTransport {
    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn send_to(&self, payload: &[u8], target: SocketAddr) -> Result<(), TransportError> {
        let filter = self.hub.filter.read().clone();
        if let Some(filter) = filter {
            if filter(self.local_addr, target, payload) {
                trace!(from = %self.local_addr, to = %target, "datagram dropped by filter");
                return Ok(());
            }
        }

        if let Some(endpoint) = self.hub.endpoints.read().get(&target) {
            // A closed receiver is a peer that went away; the datagram is lost.
            let _ = endpoint.send((payload.to_vec(), self.local_addr));
        }
        Ok(())
    }

    async fn recv_from(&self) -> Result<(Vec<u8>, SocketAddr), TransportError> {
        self.inbox.lock().await.recv().await.ok_or(TransportError::Closed)
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        self.hub.endpoints.write().remove(&self.local_addr);
    }
}
