//! # Chain
//!
//! An ordered, append-only sequence of blocks. Index 0 is genesis and every
//! later block links to the hash of the one before it.
//!
//! The chain owns its blocks by value. There is no insertion, removal, or
//! in-place edit; [`Chain::append`] is the only way a chain grows. The one
//! escape hatch is [`Chain::from_blocks`], which adopts a sequence someone
//! else produced (usually a persistence layer) without checking it. Run
//! [`Chain::verify`] on anything that arrived that way.

use tracing::debug;

use super::block::{Block, BlockHash};
use super::verify::{verify_blocks, VerificationReport, VerifyOptions};
use crate::error::ChainError;

/// Ordered chain of hash-linked blocks.
///
/// `Chain::default()` is empty, which is not a valid operating state: it
/// exists for loaders that fill a chain from storage. Start new ledgers
/// with [`Chain::genesis`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chain {
    blocks: Vec<Block>,
}

impl Chain {
    /// Create a chain containing only the genesis block.
    pub fn genesis() -> Self {
        Self {
            blocks: vec![Block::genesis()],
        }
    }

    /// Adopt an existing block sequence as-is. No hashing, no checks.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Append a new block committing to `payload`, linked to the current
    /// tail, and return it.
    ///
    /// # Errors
    ///
    /// [`ChainError::InvalidChainState`] if the chain is empty.
    pub fn append(&mut self, payload: impl Into<Vec<u8>>) -> Result<&Block, ChainError> {
        self.append_with(payload, |_, _| Ok::<(), ChainError>(()))
    }

    /// Append, but hand the new block and its index to `commit` first.
    /// The block joins the chain only if `commit` returns `Ok`, so a failed
    /// write to durable storage leaves the chain untouched.
    pub fn append_with<E, F>(
        &mut self,
        payload: impl Into<Vec<u8>>,
        commit: F,
    ) -> Result<&Block, E>
    where
        E: From<ChainError>,
        F: FnOnce(usize, &Block) -> Result<(), E>,
    {
        let tail_hash = self.tail_hash().map_err(|_| ChainError::empty_chain("append"))?;
        let index = self.blocks.len();
        let block = Block::new(payload, tail_hash.to_vec());

        commit(index, &block)?;

        debug!(
            index,
            hash = %block.hash_hex(),
            payload_len = block.payload().len(),
            "block appended"
        );

        self.blocks.push(block);
        Ok(&self.blocks[index])
    }

    /// Verify the whole chain with strict genesis checking.
    ///
    /// # Errors
    ///
    /// [`ChainError::InvalidChainState`] if the chain is empty. Integrity
    /// problems are not errors; they are listed in the report.
    pub fn verify(&self) -> Result<VerificationReport, ChainError> {
        self.verify_with(VerifyOptions::default())
    }

    /// Verify the whole chain with explicit options.
    pub fn verify_with(&self, options: VerifyOptions) -> Result<VerificationReport, ChainError> {
        if self.blocks.is_empty() {
            return Err(ChainError::empty_chain("verify"));
        }
        Ok(verify_blocks(&self.blocks, options))
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block at `index`, or `None` past the tail.
    pub fn block_at(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// The most recently appended block.
    pub fn tail(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Hash of the tail block.
    ///
    /// # Errors
    ///
    /// [`ChainError::InvalidChainState`] if the chain is empty.
    pub fn tail_hash(&self) -> Result<BlockHash, ChainError> {
        self.tail()
            .map(|block| *block.hash())
            .ok_or_else(|| ChainError::empty_chain("tail hash"))
    }

    /// Index of the first block whose stored hash equals `hash`.
    pub fn position_of(&self, hash: &BlockHash) -> Option<usize> {
        self.blocks.iter().position(|block| block.hash() == hash)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }
}

impl<'a> IntoIterator for &'a Chain {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
