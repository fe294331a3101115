//! Gossip domain: pure bookkeeping, no I/O.

pub mod history;
pub mod peers;
pub mod routing;

pub use history::{RecordOutcome, RumorHistory, StatusComparison};
pub use peers::{resolve, PeerSet};
pub use routing::RoutingTable;
