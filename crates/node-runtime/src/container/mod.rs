//! # Node Container
//!
//! Holds one node's subsystems with their lifetimes tied together:
//!
//! ```text
//! BlockLogService ──broadcast──→ GossipBroadcaster ──submit_extra──→ GossipEngine
//!        ↑                                                                │
//!        └──────────── handle_message (rumors carrying `extra`) ──────────┘
//! ```
//!
//! The gossip callback holds the block log weakly, so dropping the node
//! releases both subsystems.

pub mod config;
pub mod node;

pub use config::{ConfigError, NodeConfig};
pub use node::SwarmNode;
