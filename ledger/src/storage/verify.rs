//! # Chain Verification
//!
//! Walks a block sequence from genesis to tail and checks three things per
//! block:
//!
//! 1. **Content integrity** — the stored hash equals
//!    `SHA-256(payload || predecessor_hash)`.
//! 2. **Linkage** — for every block after the first, `predecessor_hash`
//!    equals the previous block's stored hash.
//! 3. **Genesis sentinel** — block 0 links to the empty sentinel. Skipped
//!    when [`VerifyOptions::strict_genesis`] is off.
//!
//! The walk never stops early. Every violation found is reported, so a
//! caller can see how far tampering reaches instead of only where it starts.
//!
//! Linkage compares against the previous block's *stored* hash. Editing a
//! payload without touching its hash flags only that block's content; also
//! rewriting its hash to hide the edit breaks the link from the next block.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::block::{Block, BlockHash};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Knobs for a verification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOptions {
    /// Require block 0 to link to the genesis sentinel.
    pub strict_genesis: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            strict_genesis: true,
        }
    }
}

impl VerifyOptions {
    /// Options that accept any predecessor on block 0. Useful when checking
    /// a suffix of a longer chain.
    pub fn lenient() -> Self {
        Self {
            strict_genesis: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Violations
// ---------------------------------------------------------------------------

/// Which invariant a block breaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    /// Stored hash differs from the digest of the block's own fields.
    ContentIntegrity {
        #[serde(with = "hex")]
        stored: BlockHash,
        #[serde(with = "hex")]
        computed: BlockHash,
    },
    /// Predecessor hash differs from the previous block's stored hash.
    Linkage {
        #[serde(with = "hex")]
        expected: BlockHash,
        #[serde(with = "hex")]
        found: Vec<u8>,
    },
    /// Block 0 does not link to the genesis sentinel.
    GenesisPredecessor {
        #[serde(with = "hex")]
        found: Vec<u8>,
    },
}

impl ViolationKind {
    /// Short stable label, used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ViolationKind::ContentIntegrity { .. } => "content_integrity",
            ViolationKind::Linkage { .. } => "linkage",
            ViolationKind::GenesisPredecessor { .. } => "genesis_predecessor",
        }
    }
}

/// A single failed check at a given block index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub index: usize,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

/// Outcome of a verification pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// `true` iff no check failed.
    pub valid: bool,
    /// Number of blocks examined.
    pub length: usize,
    /// Every violation found, in index order.
    pub violations: Vec<Violation>,
}

impl VerificationReport {
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Distinct indices with at least one violation, ascending.
    pub fn violated_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.violations.iter().map(|v| v.index).collect();
        indices.dedup();
        indices
    }

    /// Whether `index` has a violation with the given label
    /// (see [`ViolationKind::label`]).
    pub fn has_violation(&self, index: usize, label: &str) -> bool {
        self.violations
            .iter()
            .any(|v| v.index == index && v.kind.label() == label)
    }

    /// Violations at a single index.
    pub fn violations_at(&self, index: usize) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.index == index)
    }
}

// ---------------------------------------------------------------------------
// The Walk
// ---------------------------------------------------------------------------

/// Verify a block sequence.
///
/// O(n) in the number of blocks plus the total payload size. An empty
/// slice yields a valid, zero-length report; refusing to verify an empty
/// chain is [`Chain::verify`](super::Chain::verify)'s decision.
pub fn verify_blocks(blocks: &[Block], options: VerifyOptions) -> VerificationReport {
    let mut violations = Vec::new();

    for (index, block) in blocks.iter().enumerate() {
        if index == 0 {
            if options.strict_genesis && !block.is_genesis_linked() {
                violations.push(Violation {
                    index,
                    kind: ViolationKind::GenesisPredecessor {
                        found: block.predecessor_hash().to_vec(),
                    },
                });
            }
        } else {
            let previous = &blocks[index - 1];
            if block.predecessor_hash() != previous.hash() {
                violations.push(Violation {
                    index,
                    kind: ViolationKind::Linkage {
                        expected: *previous.hash(),
                        found: block.predecessor_hash().to_vec(),
                    },
                });
            }
        }

        let computed = block.compute_hash();
        if computed != *block.hash() {
            violations.push(Violation {
                index,
                kind: ViolationKind::ContentIntegrity {
                    stored: *block.hash(),
                    computed,
                },
            });
        }
    }

    for violation in &violations {
        warn!(
            index = violation.index,
            kind = violation.kind.label(),
            "chain integrity violation"
        );
    }
    debug!(
        length = blocks.len(),
        violations = violations.len(),
        strict_genesis = options.strict_genesis,
        "chain verification complete"
    );

    VerificationReport {
        valid: violations.is_empty(),
        length: blocks.len(),
        violations,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
