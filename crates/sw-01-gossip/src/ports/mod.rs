//! Ports for the gossip subsystem.
//!
//! - `inbound`: the API collaborators drive the engine through
//! - `outbound`: the datagram transport the engine sends and receives on

pub mod inbound;
pub mod outbound;

pub use inbound::{GossipApi, GossipCallback};
pub use outbound::{Transport, TransportError};
