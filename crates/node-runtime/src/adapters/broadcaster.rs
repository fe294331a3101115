//! # Gossip Broadcaster
//! Carries consensus sub-messages as the `extra` field of local rumors.

use std::sync::Arc;

use shared_types::ConsensusMessage;
use sw_01_gossip::GossipApi;
use sw_03_block_log::ConsensusBroadcaster;
use tracing::trace;

/// Broadcasts through the gossip layer; the local node receives its own
/// messages back through its gossip callback.
pub struct GossipBroadcaster<G: GossipApi + 'static> {
    gossip: Arc<G>,
}

impl<G: GossipApi + 'static> GossipBroadcaster<G> {
    pub fn new(gossip: Arc<G>) -> Self {
        Self { gossip }
    }
}

impl<G: GossipApi + 'static> ConsensusBroadcaster for GossipBroadcaster<G> {
    fn broadcast(&self, message: ConsensusMessage) {
        let kind = message.kind();
        let step = message.step();
        let id = self.gossip.submit_extra(message);
        trace!(kind, step, id, "consensus message submitted as rumor");
    }
}
