//! # TLC Round
//!
//! One Paxos instance for a single log position, closed by a confirmation
//! exchange.
//!
//! ```text
//! Idle ──propose──→ Proposing ──quorum of promises──→ AwaitingQuorum
//!                      ↑                                   │
//!                      └────────────timeout────────────────┤
//!                                                          │ quorum of accepts
//!                    any confirm ──→ Confirming            ↓
//!                                       │            (confirm sent)
//!                                       └─quorum of confirms─→ Committed
//! ```
//!
//! A quorum of accepts commits directly; a quorum of confirmations commits a
//! node that missed the accepts.

use std::collections::HashMap;

use shared_types::{hash_hex, AcceptedValue, Ballot, Block, ConsensusMessage, Hash};
use tracing::{debug, info};

use crate::config::ConsensusConfig;
use crate::domain::error::{ConsensusError, ConsensusResult};
use crate::domain::tally::Tally;

/// Observable state of a round, derived from its bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// No local proposal.
    Idle,
    /// Prepare sent, collecting promises.
    Proposing,
    /// Propose sent, waiting for a quorum of accepts.
    AwaitingQuorum,
    /// Confirmation sent, waiting for a quorum of confirmations.
    Confirming,
    Committed,
}

/// What the caller must do after feeding the round.
#[derive(Debug, Default, PartialEq)]
pub struct RoundOutput {
    /// Messages to broadcast to every participant, this node included.
    pub messages: Vec<ConsensusMessage>,
    /// Set exactly once, when the round commits.
    pub committed: Option<Block>,
}

impl RoundOutput {
    fn none() -> Self {
        Self::default()
    }

    fn send(message: ConsensusMessage) -> Self {
        Self {
            messages: vec![message],
            committed: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.committed.is_none()
    }
}

pub struct TlcRound {
    step: u64,
    previous_hash: Hash,
    quorum: usize,
    node_index: u32,
    paxos_retry: u64,

    // Proposer
    proposal: Option<Block>,
    ballot: Option<Ballot>,
    promises: HashMap<String, Option<AcceptedValue>>,
    propose_sent: bool,
    highest_seen: Option<Ballot>,

    // Acceptor
    promised: Option<Ballot>,
    accepted: Option<AcceptedValue>,

    // Learner
    accepts: Tally<Ballot>,
    confirms: Tally<Hash>,
    confirm_sent: bool,
    committed: Option<Block>,
}

impl TlcRound {
    /// Round for position `step`, whose block must link to `previous_hash`.
    pub fn new(config: &ConsensusConfig, step: u64, previous_hash: Hash) -> Self {
        Self {
            step,
            previous_hash,
            quorum: config.quorum(),
            node_index: config.node_index,
            paxos_retry: config.paxos_retry.max(1),
            proposal: None,
            ballot: None,
            promises: HashMap::new(),
            propose_sent: false,
            highest_seen: None,
            promised: None,
            accepted: None,
            accepts: Tally::new(),
            confirms: Tally::new(),
            confirm_sent: false,
            committed: None,
        }
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn previous_hash(&self) -> Hash {
        self.previous_hash
    }

    pub fn ballot(&self) -> Option<Ballot> {
        self.ballot
    }

    pub fn committed(&self) -> Option<&Block> {
        self.committed.as_ref()
    }

    pub fn phase(&self) -> RoundPhase {
        if self.committed.is_some() {
            RoundPhase::Committed
        } else if self.confirm_sent {
            RoundPhase::Confirming
        } else if self.proposal.is_none() {
            RoundPhase::Idle
        } else if self.propose_sent {
            RoundPhase::AwaitingQuorum
        } else {
            RoundPhase::Proposing
        }
    }

    /// True while a local proposal waits for promises or accepts.
    pub fn is_proposing(&self) -> bool {
        matches!(
            self.phase(),
            RoundPhase::Proposing | RoundPhase::AwaitingQuorum
        )
    }

    // =========================================================================
    // PROPOSER
    // =========================================================================

    /// Start proposing `value` with a ballot above any seen so far.
    pub fn propose(&mut self, value: Block) -> ConsensusResult<RoundOutput> {
        if self.committed.is_some() {
            return Err(ConsensusError::AlreadyCommitted { step: self.step });
        }
        // A confirmed value is already chosen for this step.
        if self.proposal.is_some() || self.confirm_sent {
            return Err(ConsensusError::RoundInProgress { step: self.step });
        }
        self.validate(&value)
            .map_err(|reason| ConsensusError::InvalidValue {
                step: self.step,
                reason,
            })?;

        let number = self.highest_seen.map_or(1, |seen| seen.number + 1);
        self.proposal = Some(value);
        Ok(self.prepare(number))
    }

    /// Retry after the soft deadline: bump the ballot by `paxos_retry` and
    /// restart from Prepare with the same value.
    pub fn on_timeout(&mut self) -> RoundOutput {
        if !self.is_proposing() {
            return RoundOutput::none();
        }
        let own = self.ballot.map_or(0, |ballot| ballot.number);
        let seen = self.highest_seen.map_or(0, |ballot| ballot.number);
        let number = own.max(seen) + self.paxos_retry;
        debug!(step = self.step, ballot_number = number, "round timed out, retrying");
        self.prepare(number)
    }

    /// Drop the local proposal. Acceptor and learner state survive, so the
    /// node keeps honoring its promises.
    pub fn abandon(&mut self) {
        self.proposal = None;
        self.ballot = None;
        self.promises.clear();
        self.propose_sent = false;
    }

    fn prepare(&mut self, number: u64) -> RoundOutput {
        let ballot = Ballot::new(number, self.node_index);
        self.ballot = Some(ballot);
        self.promises.clear();
        self.propose_sent = false;
        self.observe(ballot);
        RoundOutput::send(ConsensusMessage::Prepare {
            step: self.step,
            ballot,
        })
    }

    fn on_promise(
        &mut self,
        origin: &str,
        ballot: Ballot,
        accepted: Option<&AcceptedValue>,
    ) -> RoundOutput {
        if let Some(previous) = accepted {
            self.observe(previous.ballot);
        }
        if self.phase() != RoundPhase::Proposing || self.ballot != Some(ballot) {
            return RoundOutput::none();
        }

        self.promises.insert(origin.to_string(), accepted.cloned());
        if self.promises.len() < self.quorum {
            return RoundOutput::none();
        }

        let adopted = self
            .promises
            .values()
            .flatten()
            .max_by_key(|previous| previous.ballot)
            .map(|previous| previous.value.clone());
        let Some(value) = adopted.or_else(|| self.proposal.clone()) else {
            return RoundOutput::none();
        };

        debug!(
            step = self.step,
            ballot = %ballot,
            block = %hash_hex(&value.hash()),
            "promise quorum reached"
        );
        self.propose_sent = true;
        RoundOutput::send(ConsensusMessage::Propose {
            step: self.step,
            ballot,
            value,
        })
    }

    // =========================================================================
    // ACCEPTOR
    // =========================================================================

    fn admits(&self, ballot: Ballot) -> bool {
        self.promised.map_or(true, |promised| ballot >= promised)
    }

    fn on_prepare(&mut self, ballot: Ballot) -> RoundOutput {
        if !self.admits(ballot) {
            return RoundOutput::none();
        }
        self.promised = Some(ballot);
        RoundOutput::send(ConsensusMessage::Promise {
            step: self.step,
            ballot,
            accepted: self.accepted.clone(),
        })
    }

    fn on_propose(&mut self, ballot: Ballot, value: &Block) -> RoundOutput {
        if !self.admits(ballot) || self.validate(value).is_err() {
            return RoundOutput::none();
        }
        self.promised = Some(ballot);
        self.accepted = Some(AcceptedValue {
            ballot,
            value: value.clone(),
        });
        RoundOutput::send(ConsensusMessage::Accept {
            step: self.step,
            ballot,
            value: value.clone(),
        })
    }

    // =========================================================================
    // LEARNER
    // =========================================================================

    fn on_accept(&mut self, origin: &str, ballot: Ballot, value: &Block) -> RoundOutput {
        if self.committed.is_some() || self.validate(value).is_err() {
            return RoundOutput::none();
        }
        if self.accepts.record(ballot, value, origin) < self.quorum {
            return RoundOutput::none();
        }
        let Some(chosen) = self.accepts.value(&ballot).cloned() else {
            return RoundOutput::none();
        };

        let mut output = RoundOutput::none();
        if !self.confirm_sent {
            self.confirm_sent = true;
            output.messages.push(ConsensusMessage::Confirm {
                step: self.step,
                ballot,
                value: chosen.clone(),
            });
        }
        output.committed = Some(self.commit(chosen, "accept quorum"));
        output
    }

    fn on_confirm(&mut self, origin: &str, ballot: Ballot, value: &Block) -> RoundOutput {
        if self.committed.is_some() || self.validate(value).is_err() {
            return RoundOutput::none();
        }

        let mut output = RoundOutput::none();
        if !self.confirm_sent {
            self.confirm_sent = true;
            output.messages.push(ConsensusMessage::Confirm {
                step: self.step,
                ballot,
                value: value.clone(),
            });
        }

        let key = value.hash();
        if self.confirms.record(key, value, origin) >= self.quorum {
            if let Some(chosen) = self.confirms.value(&key).cloned() {
                output.committed = Some(self.commit(chosen, "confirm quorum"));
            }
        }
        output
    }

    fn commit(&mut self, value: Block, reason: &str) -> Block {
        info!(
            step = self.step,
            block = %hash_hex(&value.hash()),
            reason,
            "round committed"
        );
        self.committed = Some(value.clone());
        value
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Feed one consensus message received from `origin`.
    ///
    /// Messages for another position are ignored.
    pub fn handle(&mut self, origin: &str, message: &ConsensusMessage) -> RoundOutput {
        if message.step() != self.step {
            return RoundOutput::none();
        }
        self.observe(message.ballot());

        match message {
            ConsensusMessage::Prepare { ballot, .. } => self.on_prepare(*ballot),
            ConsensusMessage::Promise {
                ballot, accepted, ..
            } => self.on_promise(origin, *ballot, accepted.as_ref()),
            ConsensusMessage::Propose { ballot, value, .. } => self.on_propose(*ballot, value),
            ConsensusMessage::Accept { ballot, value, .. } => {
                self.on_accept(origin, *ballot, value)
            }
            ConsensusMessage::Confirm { ballot, value, .. } => {
                self.on_confirm(origin, *ballot, value)
            }
        }
    }

    fn observe(&mut self, ballot: Ballot) {
        if self.highest_seen.map_or(true, |seen| ballot > seen) {
            self.highest_seen = Some(ballot);
        }
    }

    fn validate(&self, value: &Block) -> Result<(), String> {
        if value.index != self.step {
            return Err(format!("block index {} at step {}", value.index, self.step));
        }
        if value.previous_hash != self.previous_hash {
            return Err(format!(
                "block links to {} instead of {}",
                hash_hex(&value.previous_hash),
                hash_hex(&self.previous_hash)
            ));
        }
        Ok(())
    }
}
