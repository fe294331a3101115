//! # Gossip Packets
//!
//! The datagram model. A [`GossipPacket`] carries exactly one of a rumor, a
//! status summary or a private message; serde's external tagging makes the
//! single-variant rule part of the encoding.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::consensus::ConsensusMessage;

/// One datagram's worth of gossip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GossipPacket {
    Rumor(RumorMessage),
    Status(StatusPacket),
    Private(PrivateMessage),
}

impl GossipPacket {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rumor(_) => "rumor",
            Self::Status(_) => "status",
            Self::Private(_) => "private",
        }
    }
}

/// An application message disseminated to every peer.
///
/// Ids are per origin, start at 1 and are never reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RumorMessage {
    pub origin: String,
    pub id: u32,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<ConsensusMessage>,
    /// Set on the periodic rumors that only refresh routing tables.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub route: bool,
}

impl RumorMessage {
    pub fn new(origin: impl Into<String>, id: u32, text: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            id,
            text: text.into(),
            extra: None,
            route: false,
        }
    }

    pub fn with_extra(origin: impl Into<String>, id: u32, extra: ConsensusMessage) -> Self {
        Self {
            origin: origin.into(),
            id,
            text: String::new(),
            extra: Some(extra),
            route: false,
        }
    }

    /// Empty rumor that is disseminated but never delivered to callbacks.
    pub fn route(origin: impl Into<String>, id: u32) -> Self {
        Self {
            route: true,
            ..Self::new(origin, id, "")
        }
    }

    pub fn is_route_rumor(&self) -> bool {
        self.route
    }
}

/// Next id wanted from one origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerStatus {
    pub identifier: String,
    pub next_id: u32,
}

/// Anti-entropy summary: one entry per origin the sender has heard of.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPacket {
    pub want: Vec<PeerStatus>,
}

impl StatusPacket {
    /// Next id wanted from `origin`, 1 when the origin is unknown.
    pub fn next_id(&self, origin: &str) -> u32 {
        self.want
            .iter()
            .find(|status| status.identifier == origin)
            .map_or(1, |status| status.next_id)
    }
}

/// Point-to-point payload relayed hop by hop along the routing table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateMessage {
    pub origin: String,
    pub id: u32,
    pub destination: String,
    pub hop_limit: u32,
    #[serde(with = "hex::serde")]
    pub data: Vec<u8>,
}

/// Routing table entry for one destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    pub next_hop: SocketAddr,
    /// Highest rumor id from the destination seen through `next_hop`.
    pub last_id: u32,
}
