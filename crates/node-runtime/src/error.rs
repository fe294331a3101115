//! Node-level errors.

use sw_01_gossip::{GossipError, TransportError};
use sw_03_block_log::BlockLogError;
use thiserror::Error;

use crate::container::ConfigError;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("gossip error: {0}")]
    Gossip(#[from] GossipError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    BlockLog(#[from] BlockLogError),

    #[error("port {base_port} + {index} is out of range")]
    PortRange { base_port: u16, index: usize },

    #[error("no commit at index {index} within {timeout_ms}ms")]
    CommitTimeout { index: u64, timeout_ms: u64 },
}

pub type NodeResult<T> = Result<T, NodeError>;
