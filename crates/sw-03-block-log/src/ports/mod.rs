//! Ports for the block log.

pub mod inbound;
pub mod outbound;

pub use inbound::{BlockLogApi, CommitCallback};
pub use outbound::ConsensusBroadcaster;
