//! # Core Domain Entities
//!
//! Blocks of the agreed log and the content they carry.
//!
//! ## Clusters
//!
//! - **Chain**: `Hash`, `Block`
//! - **Content**: `BlockContent` (text, file naming, swarm targets)

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// =============================================================================
// CLUSTER A: THE CHAIN
// =============================================================================

/// A 32-byte SHA-256 hash.
pub type Hash = [u8; 32];

/// Previous-hash of the genesis block and tail of an empty chain.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Lowercase hex encoding used for block keys and log fields.
pub fn hash_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// One committed entry of the log.
///
/// `previous_hash` links the block to its parent; genesis (index 0) links to
/// [`ZERO_HASH`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain, starting at 0.
    pub index: u64,
    /// Hash of the block at `index - 1`.
    #[serde(with = "hex::serde")]
    pub previous_hash: Hash,
    /// Application value agreed for this position.
    pub content: BlockContent,
}

impl Block {
    pub fn new(index: u64, previous_hash: Hash, content: BlockContent) -> Self {
        Self {
            index,
            previous_hash,
            content,
        }
    }

    /// Block at index 0 with a zero parent link.
    pub fn genesis(content: BlockContent) -> Self {
        Self::new(0, ZERO_HASH, content)
    }

    /// SHA-256 over index (little endian), parent hash and content digest.
    pub fn hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.index.to_le_bytes());
        hasher.update(self.previous_hash);
        hasher.update(self.content.digest());
        hasher.finalize().into()
    }

    pub fn hash_hex(&self) -> String {
        hash_hex(&self.hash())
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash == ZERO_HASH
    }

    /// True when `self` directly extends `parent`.
    pub fn extends(&self, parent: &Block) -> bool {
        self.index == parent.index + 1 && self.previous_hash == parent.hash()
    }
}

// =============================================================================
// CLUSTER B: BLOCK CONTENT
// =============================================================================

/// Closed set of values a block may carry, tagged by `kind` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockContent {
    /// Free-form text value.
    Text { value: String },
    /// Binds a file name to the hash of its metafile.
    Naming {
        filename: String,
        #[serde(with = "hex::serde")]
        metahash: Vec<u8>,
    },
    /// Target positions assigned to the swarm, one `[x, y, z]` per drone.
    Targets { targets: Vec<[f64; 3]> },
}

impl BlockContent {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    /// Wire tag of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Naming { .. } => "naming",
            Self::Targets { .. } => "targets",
        }
    }

    /// Canonical digest: tag followed by length-prefixed fields.
    ///
    /// Independent of the JSON layout, so re-encoding a block never changes
    /// its hash.
    pub fn digest(&self) -> Hash {
        let mut hasher = Sha256::new();
        update_prefixed(&mut hasher, self.kind().as_bytes());
        match self {
            Self::Text { value } => update_prefixed(&mut hasher, value.as_bytes()),
            Self::Naming { filename, metahash } => {
                update_prefixed(&mut hasher, filename.as_bytes());
                update_prefixed(&mut hasher, metahash);
            }
            Self::Targets { targets } => {
                hasher.update((targets.len() as u64).to_le_bytes());
                for target in targets {
                    for coordinate in target {
                        hasher.update(coordinate.to_le_bytes());
                    }
                }
            }
        }
        hasher.finalize().into()
    }
}

fn update_prefixed(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_links_to_zero_hash() {
        let genesis = Block::genesis(BlockContent::text("a"));
        assert!(genesis.is_genesis());
        assert_eq!(genesis.previous_hash, ZERO_HASH);
    }

    #[test]
    fn test_hash_covers_every_field() {
        let base = Block::new(3, [7u8; 32], BlockContent::text("a"));
        let other_index = Block::new(4, [7u8; 32], BlockContent::text("a"));
        let other_parent = Block::new(3, [8u8; 32], BlockContent::text("a"));
        let other_content = Block::new(3, [7u8; 32], BlockContent::text("b"));

        assert_ne!(base.hash(), other_index.hash());
        assert_ne!(base.hash(), other_parent.hash());
        assert_ne!(base.hash(), other_content.hash());
        assert_eq!(base.hash(), base.clone().hash());
    }

    #[test]
    fn test_digest_separates_fields() {
        let left = BlockContent::Naming {
            filename: "ab".into(),
            metahash: b"c".to_vec(),
        };
        let right = BlockContent::Naming {
            filename: "a".into(),
            metahash: b"bc".to_vec(),
        };
        assert_ne!(left.digest(), right.digest());
    }

    #[test]
    fn test_extends_checks_index_and_link() {
        let genesis = Block::genesis(BlockContent::text("a"));
        let next = Block::new(1, genesis.hash(), BlockContent::text("b"));
        let stray = Block::new(1, [1u8; 32], BlockContent::text("b"));

        assert!(next.extends(&genesis));
        assert!(!stray.extends(&genesis));
        assert!(!genesis.extends(&next));
    }

    #[test]
    fn test_content_is_tagged_by_kind() {
        let json = serde_json::to_value(BlockContent::Targets {
            targets: vec![[1.0, 2.0, 3.0]],
        })
        .unwrap();
        assert_eq!(json["kind"], "targets");

        let unknown = serde_json::from_str::<BlockContent>(r#"{"kind":"swarm"}"#);
        assert!(unknown.is_err());
    }

    #[test]
    fn test_previous_hash_is_hex_on_the_wire() {
        let block = Block::new(1, [0xab; 32], BlockContent::text("x"));
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["previous_hash"], "ab".repeat(32));

        let decoded: Block = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.hash(), block.hash());
    }
}
