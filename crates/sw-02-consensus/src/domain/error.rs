//! Consensus errors.

use thiserror::Error;

/// Errors returned to a local proposer. Protocol messages never error; the
/// round ignores the ones it cannot use.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    /// A local proposal for this position is already in flight.
    #[error("a proposal for index {step} is already in progress")]
    RoundInProgress { step: u64 },

    /// The position already has a committed value.
    #[error("index {step} is already committed")]
    AlreadyCommitted { step: u64 },

    /// The proposed block does not belong at this position.
    #[error("invalid value for index {step}: {reason}")]
    InvalidValue { step: u64, reason: String },
}

pub type ConsensusResult<T> = Result<T, ConsensusError>;
