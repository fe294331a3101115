//! # Consensus Sub-Messages
//!
//! Paxos phases plus the TLC confirmation step. Every message names the log
//! position (`step`) it belongs to and rides inside a rumor's `extra` field.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entities::Block;

/// Ballot of a proposal attempt, ordered by `(number, proposer)`.
///
/// The proposer index breaks ties so that two nodes picking the same number
/// never produce equal ballots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ballot {
    pub number: u64,
    pub proposer: u32,
}

impl Ballot {
    pub fn new(number: u64, proposer: u32) -> Self {
        Self { number, proposer }
    }
}

impl fmt::Display for Ballot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.number, self.proposer)
    }
}

/// A value an acceptor has already accepted, reported back in a promise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedValue {
    pub ballot: Ballot,
    pub value: Block,
}

/// Consensus sub-message, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConsensusMessage {
    Prepare {
        step: u64,
        ballot: Ballot,
    },
    Promise {
        step: u64,
        ballot: Ballot,
        accepted: Option<AcceptedValue>,
    },
    Propose {
        step: u64,
        ballot: Ballot,
        value: Block,
    },
    Accept {
        step: u64,
        ballot: Ballot,
        value: Block,
    },
    Confirm {
        step: u64,
        ballot: Ballot,
        value: Block,
    },
}

impl ConsensusMessage {
    /// Log position the message is about.
    pub fn step(&self) -> u64 {
        match self {
            Self::Prepare { step, .. }
            | Self::Promise { step, .. }
            | Self::Propose { step, .. }
            | Self::Accept { step, .. }
            | Self::Confirm { step, .. } => *step,
        }
    }

    pub fn ballot(&self) -> Ballot {
        match self {
            Self::Prepare { ballot, .. }
            | Self::Promise { ballot, .. }
            | Self::Propose { ballot, .. }
            | Self::Accept { ballot, .. }
            | Self::Confirm { ballot, .. } => *ballot,
        }
    }

    /// Name of the phase, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Prepare { .. } => "prepare",
            Self::Promise { .. } => "promise",
            Self::Propose { .. } => "propose",
            Self::Accept { .. } => "accept",
            Self::Confirm { .. } => "confirm",
        }
    }
}
