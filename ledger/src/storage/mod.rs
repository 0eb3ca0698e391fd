//! # Storage Module
//!
//! The data model of the ledger and everything that holds it.
//!
//! ## Architecture
//!
//! ```text
//! block.rs   — Block structure, genesis block, hash derivation
//! chain.rs   — Append-only block sequence
//! verify.rs  — Whole-chain integrity walk and violation reports
//! shared.rs  — RwLock-guarded chain handle for concurrent callers
//! db.rs      — sled persistence for block sequences
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! payload → Chain::append → Block::new → Vec<Block>
//!                                           ↓
//!                                  ChainDB (blocks, block_hashes)
//! ```
//!
//! A block's hash is fixed at construction. The chain only grows at the
//! tail. Verification recomputes every hash and every link, so it catches
//! edits made anywhere behind the chain's back: in memory, on disk, or in
//! transit.

pub mod block;
pub mod chain;
pub mod db;
pub mod shared;
pub mod verify;

pub use block::{Block, BlockHash};
pub use chain::Chain;
pub use db::ChainDB;
pub use shared::SharedChain;
pub use verify::{VerificationReport, VerifyOptions, Violation, ViolationKind};
