//! # Orbital-Swarm Test Suite
//!
//! Multi-node scenarios over the in-memory network.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── support.rs          # polling helpers, delivery recorder
//!     ├── gossip_flows.rs     # dissemination, routing, loss repair
//!     └── consensus_flows.rs  # agreement and chain growth
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sw-tests
//! cargo test -p sw-tests integration::gossip_flows::
//! ```

pub mod integration;
