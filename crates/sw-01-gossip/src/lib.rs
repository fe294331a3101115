//! # Gossip Dissemination & Routing Subsystem
//!
//! **Subsystem ID:** 1
//!
//! Epidemic dissemination of rumors between peers that only share an
//! unreliable datagram transport.
//!
//! ## Architecture
//!
//! - **Domain Layer:** per-origin rumor history, routing table, peer set
//! - **Ports Layer:** [`Transport`] (outbound datagrams), [`GossipApi`]
//!   (what collaborators call)
//! - **Adapters Layer:** tokio UDP socket, in-memory network for tests
//! - **Service Layer:** [`GossipEngine`] wiring the domain to the transport,
//!   with one receive task, one dispatcher task and the timer tasks
//!
//! ## Delivery Guarantees
//!
//! | Property | Mechanism |
//! |----------|-----------|
//! | Per-origin order | Out-of-order ids are buffered until the gap fills |
//! | At-most-once callback | Ids below `next_id` count as duplicates |
//! | Eventual delivery | Status exchange sends the lowest missing rumor |
//! | Fresh routes | Route replaced only by a strictly newer id |
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sw_01_gossip::{GossipApi, GossipConfig, GossipEngine, UdpTransport};
//!
//! # async fn run() -> Result<(), sw_01_gossip::GossipError> {
//! let transport = UdpTransport::bind("127.0.0.1:5000").await?;
//! let engine = Arc::new(GossipEngine::new(GossipConfig::new("A"), transport));
//! engine.add_peers(&["127.0.0.1:5001".to_string()])?;
//! engine.start()?;
//! engine.submit("hello");
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{MemoryNetwork, MemoryTransport, UdpTransport};
pub use codec::{CodecError, PacketCodec};
pub use config::GossipConfig;
pub use dispatcher::{dispatch, PacketHandler};
pub use domain::{PeerSet, RecordOutcome, RoutingTable, RumorHistory, StatusComparison};
pub use error::GossipError;
pub use ports::{GossipApi, GossipCallback, Transport, TransportError};
pub use service::GossipEngine;
