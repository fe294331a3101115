//! Consensus domain.

pub mod error;
pub mod round;
pub mod tally;
