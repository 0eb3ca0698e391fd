//! # ChainDB — Persistent Storage
//!
//! sled-backed storage for a block sequence. The chain core defines no
//! on-disk format of its own; this module is one persistence collaborator
//! that keeps the exact bytes of every field.
//!
//! ## Tree Layout
//!
//! | Tree           | Key                | Value              |
//! |----------------|--------------------|--------------------|
//! | `blocks`       | `index` (8B BE)    | `bincode(Block)`   |
//! | `block_hashes` | `hash` (32B)       | `index` (8B BE)    |
//! | `metadata`     | key (UTF-8)        | value (bytes)      |
//!
//! Indices are big-endian so sled's lexicographic order matches chain
//! order and range scans come back sorted.
//!
//! ## Trust
//!
//! Loading never rehashes. A block whose bytes were edited on disk loads
//! fine and then fails [`Chain::verify`]. That is the point: storage is
//! outside the trust boundary, verification is inside it.

use sled::{Batch, Db, Tree};
use std::path::Path;
use tracing::{debug, info};

use super::block::{Block, BlockHash};
use super::chain::Chain;
use crate::config::{DIGEST_ALGORITHM, LEDGER_FORMAT_VERSION};

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// The stored sequence has a hole: `expected` is absent but later
    /// blocks exist.
    #[error("missing block at index {expected} (found index {found})")]
    MissingBlock { expected: u64, found: u64 },

    /// The store was written by an incompatible layout or digest.
    #[error("format mismatch: {0}")]
    FormatMismatch(String),
}

pub type DbResult<T> = Result<T, DbError>;

// ---------------------------------------------------------------------------
// Metadata Keys
// ---------------------------------------------------------------------------

const META_LATEST_INDEX: &[u8] = b"latest_block_index";
const META_FORMAT_VERSION: &[u8] = b"format_version";
const META_DIGEST: &[u8] = b"digest_algorithm";

// ---------------------------------------------------------------------------
// ChainDB
// ---------------------------------------------------------------------------

/// Persistent store for one chain.
///
/// sled is thread-safe; share a `ChainDB` across threads with `Arc`.
/// Ordering of appends is still the caller's job (see
/// [`SharedChain`](super::SharedChain)).
#[derive(Debug, Clone)]
pub struct ChainDB {
    db: Db,
    blocks: Tree,
    block_hashes: Tree,
    metadata: Tree,
}

impl ChainDB {
    /// Open or create a database at the given filesystem path.
    ///
    /// # Errors
    ///
    /// [`DbError::FormatMismatch`] if the store was written with a different
    /// format version or digest algorithm.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a temporary database, removed when dropped. For tests.
    pub fn open_temporary() -> DbResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        let blocks = db.open_tree("blocks")?;
        let block_hashes = db.open_tree("block_hashes")?;
        let metadata = db.open_tree("metadata")?;

        let store = Self {
            db,
            blocks,
            block_hashes,
            metadata,
        };
        store.check_format()?;
        Ok(store)
    }

    /// Stamp a fresh store with the format tag, or check an existing one.
    fn check_format(&self) -> DbResult<()> {
        match self.metadata.get(META_FORMAT_VERSION)? {
            Some(bytes) => {
                let version = u32::from_be_bytes(bytes.as_ref().try_into().map_err(|_| {
                    DbError::Serialization("invalid format version bytes".to_string())
                })?);
                if version != LEDGER_FORMAT_VERSION {
                    return Err(DbError::FormatMismatch(format!(
                        "store has format {version}, expected {LEDGER_FORMAT_VERSION}"
                    )));
                }
                let digest = self
                    .metadata
                    .get(META_DIGEST)?
                    .map(|value| value.to_vec())
                    .unwrap_or_default();
                if digest != DIGEST_ALGORITHM.as_bytes() {
                    return Err(DbError::FormatMismatch(format!(
                        "store uses digest {}, expected {DIGEST_ALGORITHM}",
                        String::from_utf8_lossy(&digest)
                    )));
                }
            }
            None => {
                self.metadata.insert(
                    META_FORMAT_VERSION,
                    LEDGER_FORMAT_VERSION.to_be_bytes().to_vec(),
                )?;
                self.metadata
                    .insert(META_DIGEST, DIGEST_ALGORITHM.as_bytes())?;
            }
        }
        Ok(())
    }

    // -- Block operations ---------------------------------------------------

    /// Persist a block at `index`, index its hash, and bump the latest
    /// index if this block extends the stored sequence.
    pub fn put_block(&self, index: u64, block: &Block) -> DbResult<()> {
        let index_key = index.to_be_bytes();
        let block_bytes =
            bincode::serialize(block).map_err(|e| DbError::Serialization(e.to_string()))?;

        self.blocks.insert(index_key, block_bytes)?;
        self.block_hashes.insert(block.hash(), &index_key)?;

        // Compare-and-swap so concurrent writers never move the marker back.
        self.metadata
            .fetch_and_update(META_LATEST_INDEX, |current| {
                let stored = current.and_then(|bytes| decode_index(bytes).ok());
                match stored {
                    Some(latest) if latest >= index => current.map(|bytes| bytes.to_vec()),
                    _ => Some(index_key.to_vec()),
                }
            })?;

        self.db.flush()?;
        debug!(index, hash = %block.hash_hex(), "block persisted");
        Ok(())
    }

    /// Persist every block of `chain`, replacing whatever the store held.
    pub fn save_chain(&self, chain: &Chain) -> DbResult<()> {
        self.blocks.clear()?;
        self.block_hashes.clear()?;
        self.metadata.remove(META_LATEST_INDEX)?;

        let mut block_batch = Batch::default();
        let mut hash_batch = Batch::default();
        for (index, block) in chain.iter().enumerate() {
            let index_key = (index as u64).to_be_bytes();
            let block_bytes =
                bincode::serialize(block).map_err(|e| DbError::Serialization(e.to_string()))?;
            block_batch.insert(&index_key, block_bytes);
            hash_batch.insert(block.hash().as_slice(), &index_key);
        }
        self.blocks.apply_batch(block_batch)?;
        self.block_hashes.apply_batch(hash_batch)?;

        if !chain.is_empty() {
            self.metadata
                .insert(META_LATEST_INDEX, &(chain.len() as u64 - 1).to_be_bytes())?;
        }

        self.db.flush()?;
        info!(length = chain.len(), "chain saved");
        Ok(())
    }

    /// Retrieve the block at `index`.
    pub fn get_block(&self, index: u64) -> DbResult<Option<Block>> {
        match self.blocks.get(index.to_be_bytes())? {
            Some(bytes) => Ok(Some(decode_block(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Retrieve a block by its stored hash, with its index.
    pub fn get_block_by_hash(&self, hash: &BlockHash) -> DbResult<Option<(u64, Block)>> {
        match self.block_hashes.get(hash)? {
            Some(index_bytes) => {
                let index = decode_index(&index_bytes)?;
                Ok(self.get_block(index)?.map(|block| (index, block)))
            }
            None => Ok(None),
        }
    }

    /// Blocks with indices in `start..=end`, ascending.
    pub fn get_block_range(&self, start: u64, end: u64) -> DbResult<Vec<Block>> {
        let start_key = start.to_be_bytes();
        let end_key = end.to_be_bytes();

        let mut blocks = Vec::new();
        for result in self.blocks.range(start_key..=end_key) {
            let (_key, value) = result?;
            blocks.push(decode_block(&value)?);
        }
        Ok(blocks)
    }

    /// Read the whole stored sequence back into a [`Chain`].
    ///
    /// The result is unverified. An empty store yields an empty chain.
    ///
    /// # Errors
    ///
    /// [`DbError::MissingBlock`] if the stored indices are not contiguous
    /// from zero.
    pub fn load_chain(&self) -> DbResult<Chain> {
        let mut blocks = Vec::with_capacity(self.blocks.len());
        for result in self.blocks.iter() {
            let (key, value) = result?;
            let index = decode_index(&key)?;
            let expected = blocks.len() as u64;
            if index != expected {
                return Err(DbError::MissingBlock {
                    expected,
                    found: index,
                });
            }
            blocks.push(decode_block(&value)?);
        }

        info!(length = blocks.len(), "chain loaded from store");
        Ok(Chain::from_blocks(blocks))
    }

    // -- Metadata operations ------------------------------------------------

    /// Highest persisted index, or `None` for an empty store.
    pub fn latest_index(&self) -> DbResult<Option<u64>> {
        match self.metadata.get(META_LATEST_INDEX)? {
            Some(bytes) => Ok(Some(decode_index(&bytes)?)),
            None => Ok(None),
        }
    }

    // -- Utility operations -------------------------------------------------

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block until all pending writes are durable.
    pub fn flush(&self) -> DbResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

fn decode_block(bytes: &[u8]) -> DbResult<Block> {
    bincode::deserialize(bytes).map_err(|e| DbError::Serialization(e.to_string()))
}

fn decode_index(bytes: &[u8]) -> DbResult<u64> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| DbError::Serialization("invalid index bytes".to_string()))?;
    Ok(u64::from_be_bytes(raw))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
