//! Block log errors.

use sw_02_consensus::ConsensusError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockLogError {
    /// A local proposal for the next position has not committed yet.
    #[error("a round for index {index} is already in progress")]
    RoundInProgress { index: u64 },

    #[error("index {index} is already committed")]
    AlreadyCommitted { index: u64 },

    #[error("invalid block at index {index}: {reason}")]
    InvalidBlock { index: u64, reason: String },

    /// The block does not extend the current tail.
    #[error("block {index} does not link to the chain tail")]
    BrokenLink { index: u64 },
}

impl From<ConsensusError> for BlockLogError {
    fn from(err: ConsensusError) -> Self {
        match err {
            ConsensusError::RoundInProgress { step } => Self::RoundInProgress { index: step },
            ConsensusError::AlreadyCommitted { step } => Self::AlreadyCommitted { index: step },
            ConsensusError::InvalidValue { step, reason } => Self::InvalidBlock {
                index: step,
                reason,
            },
        }
    }
}

pub type BlockLogResult<T> = Result<T, BlockLogError>;
