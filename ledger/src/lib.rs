// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # MHChain — Ledger Core
//!
//! A minimal append-only, hash-linked ledger. Every block commits to its
//! payload and to the hash of the block before it, so rewriting any past
//! block is visible to anyone who re-walks the chain.
//!
//! ## Architecture
//!
//! - **crypto** — SHA-256 digests and the block digest construction.
//! - **storage** — Blocks, the chain, verification reports, a lock-guarded
//!   shared handle, and sled persistence.
//! - **config** — Genesis conventions and fixed parameters.
//! - **error** — Structural errors surfaced to callers.
//!
//! ## Quick Tour
//!
//! ```
//! use mhchain::storage::Chain;
//!
//! let mut chain = Chain::genesis();
//! chain.append(b"first".to_vec()).unwrap();
//! chain.append(b"second".to_vec()).unwrap();
//!
//! assert_eq!(chain.len(), 3);
//! assert!(chain.verify().unwrap().is_valid());
//! ```
//!
//! The chain is an explicit value. There is no global ledger; callers that
//! share one across threads wrap it in [`storage::SharedChain`].

pub mod config;
pub mod crypto;
pub mod error;
pub mod storage;

pub use error::ChainError;
pub use storage::{Block, BlockHash, Chain, SharedChain, VerificationReport, VerifyOptions};
