//! Driven ports (outbound dependencies)

use shared_types::ConsensusMessage;

/// Message bus the rounds talk over.
///
/// Every broadcast must also come back to the sending node's own
/// [`handle_message`](crate::BlockLogApi::handle_message): a node counts its
/// own promise, accept and confirm like anyone else's.
pub trait ConsensusBroadcaster: Send + Sync + 'static {
    /// Fire-and-forget; delivery is the bus's job.
    fn broadcast(&self, message: ConsensusMessage);
}
