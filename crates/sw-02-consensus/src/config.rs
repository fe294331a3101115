//! Consensus configuration.

use std::time::Duration;

use rand::Rng;

/// Default soft deadline before a proposer retries with a higher ballot.
pub const DEFAULT_ROUND_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct ConsensusConfig {
    /// Number of nodes taking part, fixed for the lifetime of a round.
    pub num_participants: usize,
    /// This node's index, used as the ballot tie-breaker.
    pub node_index: u32,
    /// Ballot number increment on each retry.
    pub paxos_retry: u64,
    /// Base deadline of one proposal attempt.
    pub round_timeout: Duration,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            num_participants: 1,
            node_index: 0,
            paxos_retry: 1,
            round_timeout: DEFAULT_ROUND_TIMEOUT,
        }
    }
}

impl ConsensusConfig {
    pub fn new(num_participants: usize, node_index: u32) -> Self {
        Self {
            num_participants,
            node_index,
            ..Self::default()
        }
    }

    /// Majority of participants.
    pub fn quorum(&self) -> usize {
        self.num_participants / 2 + 1
    }

    /// `round_timeout` plus up to 50% random jitter, so competing proposers
    /// drift apart instead of retrying in lockstep.
    pub fn jittered_timeout<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let base = self.round_timeout.as_millis() as u64;
        let jitter = if base >= 2 { rng.gen_range(0..=base / 2) } else { 0 };
        Duration::from_millis(base + jitter)
    }
}
