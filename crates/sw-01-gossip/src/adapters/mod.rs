//! Transport adapters.
//!
//! - `UdpTransport`: tokio UDP socket for real deployments
//! - `MemoryNetwork` / `MemoryTransport`: in-process datagram hub with loss
//!   injection, for tests and simulated swarms

pub mod memory;
pub mod udp;

pub use memory::{DropFilter, MemoryNetwork, MemoryTransport};
pub use udp::UdpTransport;
