//! # Cryptographic Primitives
//!
//! Hashing only. Blocks are linked by SHA-256 digests; nothing in the ledger
//! signs or encrypts.

pub mod hash;

pub use hash::{block_digest, sha256, sha256_array, sha256_multi};
