//! # Block Log Subsystem
//!
//! **Subsystem ID:** 3
//!
//! Turns consensus outcomes into an immutable, hash-linked chain and opens
//! the round for the next position after every commit.
//!
//! ## Flow
//!
//! ```text
//! propose(content) ──→ BlockFactory ──→ TlcRound(step = tail + 1)
//!                                             │ Prepare / Propose / ...
//!                                             ↓
//!                                   ConsensusBroadcaster (gossip)
//!                                             │
//! handle_message(origin, msg) ←───────────────┘
//!        │ commit
//!        ↓
//! ChainState.append ──→ next round ──→ replay buffered ──→ on_commit callbacks
//! ```
//!
//! ## Invariants
//!
//! - Block `k + 1` links to the hash of block `k`; genesis links to zeros.
//! - One local proposal at a time; a second one is rejected, not queued.
//! - Messages for committed positions are ignored; messages for future
//!   positions wait until that round opens.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{BlockFactory, BlockLogError, BlockLogResult, ChainState, DefaultBlockFactory};
pub use ports::{BlockLogApi, CommitCallback, ConsensusBroadcaster};
pub use service::BlockLogService;
