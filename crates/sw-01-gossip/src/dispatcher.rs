//! Packet dispatch by variant.

use std::net::SocketAddr;

use shared_types::{GossipPacket, PrivateMessage, RumorMessage, StatusPacket};

/// Receives decoded packets, one method per variant.
pub trait PacketHandler {
    fn on_rumor(&self, rumor: RumorMessage, from: SocketAddr);
    fn on_status(&self, status: StatusPacket, from: SocketAddr);
    fn on_private(&self, message: PrivateMessage, from: SocketAddr);
}

/// Route `packet` to the handler for its variant.
pub fn dispatch<H: PacketHandler + ?Sized>(handler: &H, packet: GossipPacket, from: SocketAddr) {
    match packet {
        GossipPacket::Rumor(rumor) => handler.on_rumor(rumor, from),
        GossipPacket::Status(status) => handler.on_status(status, from),
        GossipPacket::Private(message) => handler.on_private(message, from),
    }
}
