//! # Node Runtime Library
//!
//! Wires the swarm subsystems into a runnable node. The `swarm-node` binary
//! is a thin shell over [`SwarmNode`]; [`Swarm`] runs many nodes in one
//! process.
//!
//! ## Modules
//!
//! - `container/` - Node configuration and the [`SwarmNode`] container
//! - `adapters/` - Port implementations connecting subsystems
//! - `swarm` - In-process multi-node launcher

pub mod adapters;
pub mod container;
pub mod error;
pub mod swarm;

pub use adapters::GossipBroadcaster;
pub use container::{ConfigError, NodeConfig, SwarmNode};
pub use error::{NodeError, NodeResult};
pub use swarm::{node_name, Swarm, SwarmOptions, Topology};
