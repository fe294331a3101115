//! # Consensus Round Subsystem
//!
//! **Subsystem ID:** 2
//!
//! Classic Paxos (prepare, promise, propose, accept) closed by a TLC
//! confirmation step, run once per log position.
//!
//! ## Roles
//!
//! Every node plays all three roles in each round:
//!
//! - **Proposer**: only while it has a local value to propose
//! - **Acceptor**: promises and accepts by the ballot rule
//! - **Learner**: counts accepts and confirmations from distinct origins
//!
//! ## Safety
//!
//! | Rule | Effect |
//! |------|--------|
//! | Accept only if ballot ≥ promised | Older proposals cannot overwrite newer ones |
//! | Promise echoes the accepted value | A later proposer adopts a possibly chosen value |
//! | Quorum = ⌊N/2⌋ + 1 distinct origins | Any two quorums intersect |
//! | Value must extend the expected parent | No block for a different position is accepted |
//!
//! The round is synchronous and does no I/O: [`TlcRound::handle`] returns a
//! [`RoundOutput`] with messages to broadcast and, at most once, the
//! committed block. Messages a node broadcasts must also be fed back into its
//! own round, as gossip does for local rumors.

pub mod config;
pub mod domain;

pub use config::ConsensusConfig;
pub use domain::error::{ConsensusError, ConsensusResult};
pub use domain::round::{RoundOutput, RoundPhase, TlcRound};
pub use domain::tally::Tally;
