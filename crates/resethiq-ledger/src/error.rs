//! Error types for receipts and the transparency log.

use thiserror::Error;

use resethiq_core::CanonicalizationError;

/// Errors produced by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// I/O failure on a receipt file or the log.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A receipt could not be canonicalized for hashing.
    #[error(transparent)]
    Canonicalization(#[from] CanonicalizationError),

    /// A receipt document could not be parsed.
    #[error("malformed receipt: {0}")]
    MalformedReceipt(String),

    /// A log line does not have the expected shape.
    #[error("malformed log entry at line {line}: {reason}")]
    MalformedEntry { line: u64, reason: String },
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
