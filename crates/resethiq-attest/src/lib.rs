//! # resethiq Attest
//!
//! The user-facing half of the evidence kernel: assembling signed
//! attestation bundles over artifacts, verifying them offline, and
//! managing the Ed25519 keypair they are signed with.
//!
//! ## Flow
//!
//! An attestation streams the artifact once (via `resethiq-core`), builds
//! a manifest and signed payload, signs the payload's canonical JSON with
//! Ed25519, samples inclusion proofs deterministically, and writes the
//! bundle atomically. Verification re-runs the same pipeline over the
//! supplied artifact and compares every commitment, returning per-check
//! booleans rather than errors for mismatches.

pub mod assembler;
pub mod bundle;
pub mod error;
pub mod keystore;
pub mod manifest;
pub mod verifier;

pub use assembler::{attest_file, AttestOptions, AttestOutcome};
pub use bundle::{
    Attestation, CanonicalizationSpec, ProofSection, SampledProof, SignatureBlock, SignedPayload,
    ATTESTATION_SCHEMA, PROOF_TYPE, SIGNATURE_ALGORITHM, SIGNED_PAYLOAD_SCHEMA,
};
pub use error::{AttestError, KeyStoreError, Result};
pub use keystore::{KeyStore, PRIVATE_KEY_FILE, PUBLIC_KEY_FILE};
pub use manifest::{EngineIdentity, EnvSnapshot, Manifest, RunInfo, Subject, ENGINE_NAME};
pub use verifier::{verify_bundle, Checks, DigestSummary, VerificationReport};
