//! Opening the on-disk ledger.
//!
//! The store lives under `<data_dir>/db`. A fresh store is seeded with the
//! genesis block the first time it is opened for writing.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use mhchain::storage::{Chain, ChainDB};

/// Path of the sled database inside a data directory.
pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join("db")
}

/// Open (creating if needed) the store under `data_dir`.
pub fn open_db(data_dir: &Path) -> Result<ChainDB> {
    let path = db_path(data_dir);
    std::fs::create_dir_all(&path)
        .with_context(|| format!("failed to create database directory: {}", path.display()))?;
    let db = ChainDB::open(&path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;
    tracing::debug!(path = %path.display(), "database opened");
    Ok(db)
}

/// Load the stored chain, persisting a genesis block first if the store
/// is empty. Idempotent.
pub fn initialize_chain(db: &ChainDB) -> Result<Chain> {
    if db.is_empty() {
        let chain = Chain::genesis();
        db.save_chain(&chain)
            .context("failed to persist genesis block")?;
        if let Some(genesis) = chain.block_at(0) {
            tracing::info!(hash = %genesis.hash_hex(), "genesis block persisted");
        }
        return Ok(chain);
    }

    let chain = db.load_chain().context("failed to load chain from store")?;
    tracing::info!(length = chain.len(), "chain loaded");
    Ok(chain)
}

/// Load the stored chain without creating anything.
pub fn load_existing_chain(db: &ChainDB) -> Result<Chain> {
    if db.is_empty() {
        anyhow::bail!("ledger is not initialized; run `mhchain-node init` first");
    }
    db.load_chain().context("failed to load chain from store")
}
