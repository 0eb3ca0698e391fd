//! Thread-safe chain handle.
//!
//! `Chain::append` reads the tail hash and then pushes; two unsynchronized
//! appenders could both read the same tail and fork the chain. This wrapper
//! serializes writers behind a single `RwLock` and lets readers proceed in
//! parallel. Readers get owned copies so no guard escapes the call.

use std::sync::Arc;

use parking_lot::RwLock;

use super::block::{Block, BlockHash};
use super::chain::Chain;
use super::verify::{VerificationReport, VerifyOptions};
use crate::error::ChainError;

/// Cloneable, lock-guarded handle to a [`Chain`].
#[derive(Debug, Clone, Default)]
pub struct SharedChain {
    inner: Arc<RwLock<Chain>>,
}

impl SharedChain {
    pub fn new(chain: Chain) -> Self {
        Self {
            inner: Arc::new(RwLock::new(chain)),
        }
    }

    /// Shared handle to a fresh genesis-only chain.
    pub fn genesis() -> Self {
        Self::new(Chain::genesis())
    }

    /// Append under the write lock. Returns the new block and its index.
    pub fn append(&self, payload: impl Into<Vec<u8>>) -> Result<(usize, Block), ChainError> {
        self.append_with(payload, |_, _| Ok::<(), ChainError>(()))
    }

    /// [`Chain::append_with`] under the write lock. `commit` runs while the
    /// lock is held, so writes to durable storage happen in chain order and
    /// a failed write never leaves an unpersisted block in memory.
    pub fn append_with<E, F>(
        &self,
        payload: impl Into<Vec<u8>>,
        commit: F,
    ) -> Result<(usize, Block), E>
    where
        E: From<ChainError>,
        F: FnOnce(usize, &Block) -> Result<(), E>,
    {
        let mut chain = self.inner.write();
        let block = chain.append_with(payload, commit)?.clone();
        Ok((chain.len() - 1, block))
    }

    pub fn verify_with(&self, options: VerifyOptions) -> Result<VerificationReport, ChainError> {
        self.inner.read().verify_with(options)
    }

    pub fn verify(&self) -> Result<VerificationReport, ChainError> {
        self.verify_with(VerifyOptions::default())
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn block_at(&self, index: usize) -> Option<Block> {
        self.inner.read().block_at(index).cloned()
    }

    pub fn tail_hash(&self) -> Result<BlockHash, ChainError> {
        self.inner.read().tail_hash()
    }

    /// Clone of the whole chain as of now.
    pub fn snapshot(&self) -> Chain {
        self.inner.read().clone()
    }

    /// Run `f` against the chain under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&Chain) -> R) -> R {
        f(&self.inner.read())
    }
}
