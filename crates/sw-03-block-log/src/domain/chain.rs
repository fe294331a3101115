//! Chain state management

use std::collections::HashMap;

use shared_types::{hash_hex, Block, Hash, ZERO_HASH};

use crate::domain::error::{BlockLogError, BlockLogResult};

/// Committed blocks keyed by hex hash, plus the tail.
#[derive(Debug, Default)]
pub struct ChainState {
    blocks: HashMap<String, Block>,
    tail: Option<Block>,
}

impl ChainState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `block` if it extends the tail (or is genesis on an empty chain).
    pub fn append(&mut self, block: Block) -> BlockLogResult<()> {
        let links = match &self.tail {
            Some(tail) => block.extends(tail),
            None => block.is_genesis(),
        };
        if !links {
            return Err(BlockLogError::BrokenLink { index: block.index });
        }

        self.blocks.insert(block.hash_hex(), block.clone());
        self.tail = Some(block);
        Ok(())
    }

    pub fn tail(&self) -> Option<&Block> {
        self.tail.as_ref()
    }

    /// Hash of the tail, zeros when empty.
    pub fn tail_hash(&self) -> Hash {
        self.tail.as_ref().map_or(ZERO_HASH, Block::hash)
    }

    pub fn tail_hash_hex(&self) -> String {
        hash_hex(&self.tail_hash())
    }

    /// Index the next committed block will have.
    pub fn next_index(&self) -> u64 {
        self.tail.as_ref().map_or(0, |tail| tail.index + 1)
    }

    pub fn get(&self, hash_hex: &str) -> Option<&Block> {
        self.blocks.get(hash_hex)
    }

    pub fn blocks(&self) -> &HashMap<String, Block> {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks from genesis to tail, following parent links.
    pub fn ordered(&self) -> Vec<Block> {
        let mut ordered = Vec::with_capacity(self.blocks.len());
        let mut cursor = self.tail.clone();
        while let Some(block) = cursor {
            cursor = if block.is_genesis() {
                None
            } else {
                self.blocks.get(&hash_hex(&block.previous_hash)).cloned()
            };
            ordered.push(block);
        }
        ordered.reverse();
        ordered
    }

    /// Walk back from the tail and check every link down to genesis.
    pub fn verify(&self) -> bool {
        let ordered = self.ordered();
        if ordered.len() != self.blocks.len() {
            return false;
        }
        match ordered.first() {
            Some(genesis) if !genesis.is_genesis() => return false,
            _ => {}
        }
        ordered.windows(2).all(|pair| pair[1].extends(&pair[0]))
    }
}
