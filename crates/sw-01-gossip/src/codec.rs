//! JSON packet codec.

use shared_types::GossipPacket;
use thiserror::Error;

use crate::config::MAX_DATAGRAM_SIZE;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed packet: {0}")]
    Malformed(String),

    #[error("packet of {size} bytes exceeds the {max} byte datagram limit")]
    TooLarge { size: usize, max: usize },
}

/// Encodes and decodes [`GossipPacket`]s within a datagram size limit.
#[derive(Debug, Clone, Copy)]
pub struct PacketCodec {
    max_size: usize,
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self::new(MAX_DATAGRAM_SIZE)
    }
}

impl PacketCodec {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }

    pub fn encode(&self, packet: &GossipPacket) -> Result<Vec<u8>, CodecError> {
        let bytes =
            serde_json::to_vec(packet).map_err(|e| CodecError::Malformed(e.to_string()))?;
        self.check_size(bytes.len())?;
        Ok(bytes)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<GossipPacket, CodecError> {
        self.check_size(bytes.len())?;
        serde_json::from_slice(bytes).map_err(|e| CodecError::Malformed(e.to_string()))
    }

    fn check_size(&self, size: usize) -> Result<(), CodecError> {
        if size > self.max_size {
            return Err(CodecError::TooLarge {
                size,
                max: self.max_size,
            });
        }
        Ok(())
    }
}
