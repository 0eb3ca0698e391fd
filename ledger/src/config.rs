//! # Ledger Constants
//!
//! The genesis convention and hashing parameters live here. Every chain
//! ever written depends on these values: changing any of them changes every
//! derived hash, and previously stored chains stop verifying.

// ---------------------------------------------------------------------------
// Genesis Convention
// ---------------------------------------------------------------------------

/// Payload committed by the genesis block.
pub const GENESIS_PAYLOAD: &[u8] = b"Genesis";

/// Predecessor hash of the genesis block. Empty, so it can never be
/// mistaken for a real 32-byte digest.
pub const GENESIS_PREDECESSOR: &[u8] = b"";

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// Digest used for block hashes.
pub const DIGEST_ALGORITHM: &str = "SHA-256";

/// Digest output length in bytes.
pub const HASH_OUTPUT_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Persistence & Front Ends
// ---------------------------------------------------------------------------

/// Format tag stored alongside persisted chains. Bump when the on-disk
/// record layout changes.
pub const LEDGER_FORMAT_VERSION: u32 = 1;

/// Largest payload the HTTP front end accepts in a single append (1 MiB).
/// The core itself places no limit on payload size.
pub const MAX_API_PAYLOAD_BYTES: usize = 1024 * 1024;

/// Returns `true` if `predecessor` is the genesis sentinel.
pub fn is_genesis_sentinel(predecessor: &[u8]) -> bool {
    predecessor == GENESIS_PREDECESSOR
}
