//! Error types for the resethiq core.

use thiserror::Error;

/// Errors produced by core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Chunk size must be a positive number of bytes.
    #[error("chunk size must be a positive number of bytes")]
    NonPositiveChunkSize,

    /// Underlying I/O failure while streaming an artifact.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Canonicalization failure.
    #[error(transparent)]
    Canonicalization(#[from] CanonicalizationError),

    /// Proof construction failure.
    #[error(transparent)]
    Proof(#[from] ProofError),
}

/// Errors produced while canonicalizing a structure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanonicalizationError {
    /// Non-finite numbers have no canonical representation.
    #[error("non-finite number cannot be canonicalized")]
    NonFinite,

    /// Cyclic structures cannot be serialized.
    #[error("cyclic structure cannot be canonicalized")]
    Cycle,

    /// The value could not be converted into a JSON tree.
    #[error("encoding error: {0}")]
    Encoding(String),
}

/// Errors produced while constructing an inclusion proof.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProofError {
    /// Proofs are undefined for an empty tree (the root is not).
    #[error("cannot prove inclusion in an empty tree")]
    EmptyTree,

    /// The requested leaf index does not exist.
    #[error("leaf index {index} out of range (tree has {count} leaves)")]
    IndexOutOfRange { index: u64, count: u64 },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
