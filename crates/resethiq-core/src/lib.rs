//! # resethiq Core
//!
//! Pure primitives for the resethiq evidence kernel: digests, canonical
//! serialization, streaming fingerprinting, and Merkle commitments.
//!
//! This crate contains no persistent state and no signing. It is pure
//! computation over byte streams and structured records.
//!
//! ## Key Types
//!
//! - [`Blake2b512Hash`] - 64-byte BLAKE2b digest (leaves, nodes, roots)
//! - [`Fingerprint`] - One-pass digest of an artifact: file digests,
//!   ordered leaf hashes, and the Merkle commitment over them
//! - [`InclusionProof`] - Sibling co-path proving a leaf's membership
//! - [`Record`] - A structured record (positional or keyed) ready for
//!   canonicalization
//!
//! ## Canonicalization
//!
//! Every signature-covered structure is hashed over canonical JSON
//! (byte-sorted keys, no whitespace, minimal escapes). See [`canonical`].

pub mod canonical;
pub mod digest;
pub mod error;
pub mod fingerprint;
pub mod merkle;

pub use canonical::{canonical_json, canonical_json_bytes, canonical_record, Record};
pub use digest::{Blake2b512Hash, Sha256Hash, Sha512Hash};
pub use error::{CanonicalizationError, CoreError, ProofError, Result};
pub use fingerprint::{
    fingerprint_file, fingerprint_reader, record_leaf, FileDigests, Fingerprint,
    MerkleCommitment, DEFAULT_CHUNK_SIZE,
};
pub use merkle::{
    build_levels, empty_root, inclusion_proof, merkle_root, verify_inclusion, InclusionProof,
    MERKLE_ALGORITHM,
};
