//! # Hashing Utilities
//!
//! SHA-256 is the only digest in the ledger. Block hashes have always been
//! SHA-256 over `payload || predecessor_hash`, and a chain written with one
//! digest cannot be verified with another, so there is no algorithm switch.
//!
//! All functions here are pure: no shared hasher, no global state. They are
//! safe to call concurrently, which lets a front end hash payloads in
//! parallel before appending them in order.

use sha2::{Digest, Sha256};

use crate::config::HASH_OUTPUT_LENGTH;

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use mhchain::crypto::sha256;
///
/// let hash = sha256(b"mhchain");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> Vec<u8> {
    sha256_array(data).to_vec()
}

/// Compute the SHA-256 hash and return a fixed-size array.
pub fn sha256_array(data: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
    sha256_multi(&[data])
}

/// Hash several byte slices as if they were concatenated, without building
/// the concatenated buffer.
pub fn sha256_multi(parts: &[&[u8]]) -> [u8; HASH_OUTPUT_LENGTH] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; HASH_OUTPUT_LENGTH];
    output.copy_from_slice(&result);
    output
}

/// Derive a block hash: `SHA-256(payload || predecessor_hash)`.
///
/// The order is fixed. Payload first, predecessor second; swapping them
/// yields a different hash for every block and breaks every stored chain.
/// There is no separator or length prefix between the two fields.
///
/// # Example
///
/// ```
/// use mhchain::crypto::{block_digest, sha256_array};
///
/// let digest = block_digest(b"payload", b"prev");
/// assert_eq!(digest, sha256_array(b"payloadprev"));
/// ```
pub fn block_digest(payload: &[u8], predecessor_hash: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
    sha256_multi(&[payload, predecessor_hash])
}
