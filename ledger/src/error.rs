//! Error types for chain operations.
//!
//! Only structural failures are errors. Integrity violations found while
//! walking a chain are data, reported through
//! [`VerificationReport`](crate::storage::VerificationReport).

use thiserror::Error;

/// Errors returned by [`Chain`](crate::storage::Chain) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The chain has no blocks, so there is no tail to link to or walk from.
    /// A chain built with `Chain::genesis()` never reaches this state.
    #[error("invalid chain state: {0}")]
    InvalidChainState(String),
}

impl ChainError {
    pub(crate) fn empty_chain(operation: &str) -> Self {
        ChainError::InvalidChainState(format!("{operation} on an empty chain"))
    }
}
