//! Offline bundle verification.
//!
//! The verifier re-runs the fingerprinter over the supplied artifact and
//! compares every commitment in the bundle. Mismatches are first-class
//! results with per-check booleans; only I/O and unusable bundles are
//! errors.
//!
//! The signed-message digest is recomputed from the *canonical* JSON of
//! the deserialized claims. No check relies on accidental agreement with
//! a general-purpose serializer.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ed25519_dalek::pkcs8::DecodePublicKey;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::Serialize;
use std::path::Path;

use resethiq_core::canonical::canonical_json_bytes;
use resethiq_core::{
    fingerprint_file, verify_inclusion, Blake2b512Hash, Fingerprint, InclusionProof, Sha512Hash,
};

use crate::bundle::Attestation;
use crate::error::{AttestError, Result};

/// Digest summary rendered on both sides of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestSummary {
    pub blake2b_512: String,
    pub sha512: String,
    pub merkle_root: String,
    pub leaf_count: u64,
}

/// Per-check outcomes. `ok` on the report is their conjunction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Checks {
    pub file_blake2b_match: bool,
    pub file_sha512_match: bool,
    pub merkle_root_match: bool,
    pub leaf_count_match: bool,
    pub manifest_hash_match: bool,
    pub signed_message_hash_match: bool,
    pub signature_valid: bool,
    pub sampled_proofs_valid: bool,
}

impl Checks {
    fn all(&self) -> bool {
        self.file_blake2b_match
            && self.file_sha512_match
            && self.merkle_root_match
            && self.leaf_count_match
            && self.manifest_hash_match
            && self.signed_message_hash_match
            && self.signature_valid
            && self.sampled_proofs_valid
    }
}

/// The result of verifying a bundle against an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub ok: bool,
    pub bytes_read: u64,
    pub expected: DigestSummary,
    pub actual: DigestSummary,
    pub checks: Checks,
}

/// Verify `bundle` against the artifact at `artifact`.
pub fn verify_bundle(bundle: &Attestation, artifact: &Path) -> Result<VerificationReport> {
    let chunk_size = bundle.claims.merkle.chunk_size;
    if chunk_size == 0 {
        return Err(AttestError::MalformedBundle(
            "claims carry a zero chunk size".to_string(),
        ));
    }
    let recomputed = fingerprint_file(artifact, chunk_size as usize)?;

    let claims = &bundle.claims;
    let manifest_hash_match = Sha512Hash::hash(&canonical_json_bytes(&bundle.manifest)?)
        == claims.manifest_sha512;

    let signed_message = canonical_json_bytes(claims)?;
    let signed_message_hash_match =
        Sha512Hash::hash(&signed_message) == bundle.signature.signed_message_sha512;
    let signature_valid = check_signature(
        &bundle.signature.public_key_pem,
        &bundle.signature.signature_b64,
        &signed_message,
    );

    let checks = Checks {
        file_blake2b_match: recomputed.file_digests.blake2b_512 == claims.file_digests.blake2b_512,
        file_sha512_match: recomputed.file_digests.sha512 == claims.file_digests.sha512,
        merkle_root_match: recomputed.merkle.root == claims.merkle.root,
        leaf_count_match: recomputed.merkle.leaf_count == claims.merkle.leaf_count,
        manifest_hash_match,
        signed_message_hash_match,
        signature_valid,
        sampled_proofs_valid: check_sampled_proofs(bundle),
    };
    if !checks.all() {
        tracing::warn!(artifact = %artifact.display(), ?checks, "verification mismatch");
    }

    Ok(VerificationReport {
        ok: checks.all(),
        bytes_read: recomputed.bytes,
        expected: summary_of_claims(bundle),
        actual: summary_of_fingerprint(&recomputed),
        checks,
    })
}

fn summary_of_claims(bundle: &Attestation) -> DigestSummary {
    DigestSummary {
        blake2b_512: bundle.claims.file_digests.blake2b_512.to_hex(),
        sha512: bundle.claims.file_digests.sha512.to_hex(),
        merkle_root: bundle.claims.merkle.root.to_hex(),
        leaf_count: bundle.claims.merkle.leaf_count,
    }
}

fn summary_of_fingerprint(fp: &Fingerprint) -> DigestSummary {
    DigestSummary {
        blake2b_512: fp.file_digests.blake2b_512.to_hex(),
        sha512: fp.file_digests.sha512.to_hex(),
        merkle_root: fp.merkle.root.to_hex(),
        leaf_count: fp.merkle.leaf_count,
    }
}

/// Validate the Ed25519 signature. Undecodable key or signature material
/// is a failed check, not an error.
fn check_signature(public_key_pem: &str, signature_b64: &str, message: &[u8]) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_public_key_pem(public_key_pem) else {
        return false;
    };
    let Ok(signature_bytes) = BASE64.decode(signature_b64) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(&signature_bytes) else {
        return false;
    };
    verifying_key.verify(message, &signature).is_ok()
}

/// Re-verify each sampled proof against the claimed root. A bundle with
/// no samples (empty artifact) passes vacuously.
fn check_sampled_proofs(bundle: &Attestation) -> bool {
    let root = &bundle.claims.merkle.root;
    bundle.proofs.sampled.iter().all(|sample| {
        let Ok(leaf_hash) = Blake2b512Hash::from_hex(&sample.leaf_hex) else {
            return false;
        };
        let mut siblings = Vec::with_capacity(sample.siblings_hex.len());
        for hex in &sample.siblings_hex {
            match Blake2b512Hash::from_hex(hex) {
                Ok(h) => siblings.push(h),
                Err(_) => return false,
            }
        }
        let proof = InclusionProof {
            index: sample.index,
            leaf_hash,
            siblings,
        };
        verify_inclusion(root, &proof)
    })
}
