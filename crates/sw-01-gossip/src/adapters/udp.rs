//! UDP transport.

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::UdpSocket;

use crate::config::MAX_DATAGRAM_SIZE;
use crate::ports::{Transport, TransportError};

/// [`Transport`] over a tokio UDP socket.
///
/// Sends use `try_send_to`: if the kernel buffer is full the datagram is
/// dropped, like any other loss.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    local_addr: SocketAddr,
    max_datagram_size: usize,
}

impl UdpTransport {
    /// Bind to `bind_addr` (e.g. "127.0.0.1:5000").
    ///
    /// # Errors
    ///
    /// Returns error if the socket cannot be bound.
    pub async fn bind(bind_addr: &str) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(bind_addr).await?;
        let local_addr = socket.local_addr()?;
        Ok(Self {
            socket,
            local_addr,
            max_datagram_size: MAX_DATAGRAM_SIZE,
        })
    }
}

#[async_trait]
impl Transport for UdpTransport {
    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn send_to(&self, payload: &[u8], target: SocketAddr) -> Result<(), TransportError> {
        self.socket.try_send_to(payload, target)?;
        Ok(())
    }

    async fn recv_from(&self) -> Result<(Vec<u8>, SocketAddr), TransportError> {
        let mut buf = vec![0u8; self.max_datagram_size];
        let (len, from) = self.socket.recv_from(&mut buf).await?;
        buf.truncate(len);
        Ok((buf, from))
    }
}
