//! Error types for attestation assembly and verification.

use std::path::PathBuf;
use thiserror::Error;

use resethiq_core::{CanonicalizationError, CoreError, ProofError};
use resethiq_ledger::LedgerError;

/// Errors produced by the attestation layer.
///
/// Note that a failed verification is NOT an error: mismatches come back
/// as a [`crate::VerificationReport`] with `ok == false`.
#[derive(Debug, Error)]
pub enum AttestError {
    /// Caller-supplied configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O failure while reading the artifact or writing outputs.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure inside the core primitives.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Key store failure.
    #[error(transparent)]
    KeyStore(#[from] KeyStoreError),

    /// Receipt or transparency-log failure.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A bundle document could not be parsed or is internally unusable.
    #[error("malformed bundle: {0}")]
    MalformedBundle(String),
}

impl From<CanonicalizationError> for AttestError {
    fn from(e: CanonicalizationError) -> Self {
        AttestError::Core(CoreError::Canonicalization(e))
    }
}

impl From<ProofError> for AttestError {
    fn from(e: ProofError) -> Self {
        AttestError::Core(CoreError::Proof(e))
    }
}

/// Errors produced by the Ed25519 key store.
#[derive(Debug, Error)]
pub enum KeyStoreError {
    /// I/O failure on a key file or the creation lock.
    #[error("key store i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A key file exists but could not be decoded.
    #[error("malformed key material in {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// The stored public key does not belong to the stored private key.
    #[error("public key does not match private key in {dir}")]
    KeyMismatch { dir: PathBuf },

    /// Key generation or PEM export failed.
    #[error("key generation failed: {0}")]
    Generation(String),
}

/// Result type for attestation operations.
pub type Result<T> = std::result::Result<T, AttestError>;
