//! Outbound port: datagram transport.

use std::net::SocketAddr;

use async_trait::async_trait;
use thiserror::Error;

/// Unreliable datagram transport.
///
/// Sends are fire-and-forget: `Ok` only means the datagram left this node.
/// Implementations must not interpret payloads.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Address peers reach this node at.
    fn local_addr(&self) -> SocketAddr;

    /// Queue one datagram for `target` without waiting.
    fn send_to(&self, payload: &[u8], target: SocketAddr) -> Result<(), TransportError>;

    /// Wait for the next datagram and its sender.
    async fn recv_from(&self) -> Result<(Vec<u8>, SocketAddr), TransportError>;
}

/// Errors from transport operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("socket error: {0}")]
    Io(String),

    /// Another endpoint already owns the address.
    #[error("address {0} already in use")]
    AddrInUse(SocketAddr),

    /// The transport was shut down; no more datagrams will arrive.
    #[error("transport closed")]
    Closed,
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
