//! # Block Structure
//!
//! A block is one immutable record in the ledger: an opaque payload, the
//! hash of the block before it, and its own hash.
//!
//! ## Block Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Block                                      │
//! │  ├── payload: Vec<u8>          (any length) │
//! │  ├── predecessor_hash: Vec<u8> (32B, or     │
//! │  │                              empty for   │
//! │  │                              genesis)    │
//! │  └── hash: [u8; 32]                         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Hash Computation
//!
//! `hash = SHA-256(payload || predecessor_hash)`, computed exactly once in
//! [`Block::new`]. Fields are private and there are no setters, so a block
//! built through `new` always satisfies its content-integrity invariant.
//!
//! Blocks read back from storage go through [`Block::from_raw_parts`] or
//! serde, which take the stored hash as-is. Whether that hash still matches
//! is a question for verification, not for loading.

use serde::{Deserialize, Serialize};

use crate::config::{is_genesis_sentinel, GENESIS_PAYLOAD, GENESIS_PREDECESSOR, HASH_OUTPUT_LENGTH};
use crate::crypto::hash::block_digest;

/// A 32-byte SHA-256 block hash.
pub type BlockHash = [u8; HASH_OUTPUT_LENGTH];

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// One record in the chain.
///
/// Serializes with hex-encoded byte fields so JSON output stays readable;
/// the bytes themselves round-trip exactly.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    /// Caller-supplied data committed by this block.
    #[serde(with = "hex")]
    payload: Vec<u8>,
    /// Hash of the previous block. Empty for genesis.
    #[serde(with = "hex")]
    predecessor_hash: Vec<u8>,
    /// `SHA-256(payload || predecessor_hash)` as of construction.
    #[serde(with = "hex")]
    hash: BlockHash,
}

impl Block {
    /// Construct a block and derive its hash.
    ///
    /// Does not check that `predecessor_hash` belongs to any chain; linking
    /// is [`Chain::append`](super::Chain::append)'s job.
    pub fn new(payload: impl Into<Vec<u8>>, predecessor_hash: impl Into<Vec<u8>>) -> Self {
        let payload = payload.into();
        let predecessor_hash = predecessor_hash.into();
        let hash = block_digest(&payload, &predecessor_hash);

        Block {
            payload,
            predecessor_hash,
            hash,
        }
    }

    /// Construct the genesis block: the genesis marker payload linked to
    /// the empty sentinel.
    pub fn genesis() -> Self {
        Block::new(GENESIS_PAYLOAD, GENESIS_PREDECESSOR)
    }

    /// Rebuild a block from previously stored fields without rehashing.
    ///
    /// Meant for persistence layers reading blocks back. The result may
    /// violate the content-integrity invariant if the stored bytes were
    /// altered; [`Block::is_intact`] and chain verification detect that.
    pub fn from_raw_parts(payload: Vec<u8>, predecessor_hash: Vec<u8>, hash: BlockHash) -> Self {
        Block {
            payload,
            predecessor_hash,
            hash,
        }
    }

    /// Recompute the hash from the current fields.
    pub fn compute_hash(&self) -> BlockHash {
        block_digest(&self.payload, &self.predecessor_hash)
    }

    /// Whether the stored hash matches the recomputed one.
    pub fn is_intact(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Whether this block links to the genesis sentinel.
    pub fn is_genesis_linked(&self) -> bool {
        is_genesis_sentinel(&self.predecessor_hash)
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn predecessor_hash(&self) -> &[u8] {
        &self.predecessor_hash
    }

    pub fn hash(&self) -> &BlockHash {
        &self.hash
    }

    /// Return the block hash as a hex string.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Return the predecessor hash as a hex string (empty for genesis).
    pub fn predecessor_hash_hex(&self) -> String {
        hex::encode(&self.predecessor_hash)
    }

    /// Split the block into `(payload, predecessor_hash, hash)`.
    pub fn into_raw_parts(self) -> (Vec<u8>, Vec<u8>, BlockHash) {
        (self.payload, self.predecessor_hash, self.hash)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::sha256_array;

    #[test]
    fn genesis_block_properties() {
        let genesis = Block::genesis();
        assert_eq!(genesis.payload(), GENESIS_PAYLOAD);
        assert!(genesis.predecessor_hash().is_empty());
        assert!(genesis.is_genesis_linked());
        assert!(genesis.is_intact());
    }

    #[test]
    fn genesis_hash_is_deterministic() {
        let g1 = Block::genesis();
        let g2 = Block::genesis();
        assert_eq!(g1.hash(), g2.hash());
        assert_eq!(*g1.hash(), sha256_array(GENESIS_PAYLOAD));
    }

    #[test]
    fn new_block_hashes_payload_then_predecessor() {
        let genesis = Block::genesis();
        let block = Block::new(b"first".to_vec(), genesis.hash().to_vec());

        let mut preimage = b"first".to_vec();
        preimage.extend_from_slice(genesis.hash());
        assert_eq!(*block.hash(), sha256_array(&preimage));
        assert_eq!(block.predecessor_hash(), genesis.hash());
    }

    #[test]
    fn empty_payload_is_allowed() {
        let genesis = Block::genesis();
        let block = Block::new(Vec::new(), genesis.hash().to_vec());
        assert!(block.payload().is_empty());
        assert!(block.is_intact());
        assert_eq!(*block.hash(), sha256_array(genesis.hash()));
    }

    #[test]
    fn tampered_payload_is_not_intact() {
        let block = Block::new(b"original".to_vec(), vec![7u8; 32]);
        let (_, prev, hash) = block.into_raw_parts();

        let tampered = Block::from_raw_parts(b"tampered".to_vec(), prev, hash);
        assert!(!tampered.is_intact());
    }

    #[test]
    fn tampered_hash_is_not_intact() {
        let block = Block::new(b"data".to_vec(), vec![1u8; 32]);
        let (payload, prev, mut hash) = block.into_raw_parts();
        hash[0] ^= 0xFF;

        assert!(!Block::from_raw_parts(payload, prev, hash).is_intact());
    }

    #[test]
    fn raw_parts_roundtrip_preserves_bytes() {
        let block = Block::new(vec![0u8, 255, 10, 13], vec![9u8; 32]);
        let (payload, prev, hash) = block.clone().into_raw_parts();
        assert_eq!(Block::from_raw_parts(payload, prev, hash), block);
    }

    #[test]
    fn hex_accessors() {
        let genesis = Block::genesis();
        assert_eq!(genesis.hash_hex().len(), 64);
        assert_eq!(genesis.predecessor_hash_hex(), "");
    }

    #[test]
    fn block_serialization_roundtrip() {
        let block = Block::new(b"\x00binary\xff".to_vec(), Block::genesis().hash().to_vec());
        let json = serde_json::to_string(&block).expect("serialize");
        assert!(json.contains(&block.hash_hex()));

        let recovered: Block = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(block, recovered);
        assert!(recovered.is_intact());
    }
}
