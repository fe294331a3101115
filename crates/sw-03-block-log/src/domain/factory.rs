//! Block construction.

use shared_types::{Block, BlockContent, Hash, ZERO_HASH};

/// Builds blocks from application content, so the log stays agnostic of
/// what the content means.
pub trait BlockFactory: Send + Sync + 'static {
    fn new_block(&self, index: u64, previous_hash: Hash, content: BlockContent) -> Block;

    fn new_genesis_block(&self, content: BlockContent) -> Block {
        self.new_block(0, ZERO_HASH, content)
    }
}

/// Wraps content unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBlockFactory;

impl BlockFactory for DefaultBlockFactory {
    fn new_block(&self, index: u64, previous_hash: Hash, content: BlockContent) -> Block {
        Block::new(index, previous_hash, content)
    }
}
