//! Gossip subsystem errors.

use thiserror::Error;

use crate::codec::CodecError;
use crate::ports::TransportError;

/// Errors surfaced by the gossip engine's API.
///
/// Packet-level failures (bad bytes, unreachable peers) are logged and
/// absorbed by the engine; only caller mistakes reach this type.
#[derive(Debug, Error)]
pub enum GossipError {
    /// A peer address could not be parsed or resolved.
    #[error("invalid peer address '{address}': {reason}")]
    AddressFormat { address: String, reason: String },

    /// `start` was called on an engine that is running or was stopped.
    #[error("gossip engine already started")]
    AlreadyStarted,

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}
