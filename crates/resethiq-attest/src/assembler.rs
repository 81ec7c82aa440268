//! Attestation assembler: stream, commit, sign, sample, persist.
//!
//! Everything written here goes through a temp file in the target
//! directory followed by an atomic rename, so an abandoned run leaves no
//! partial bundle visible.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use resethiq_core::canonical::canonical_json_bytes;
use resethiq_core::{
    fingerprint_file, inclusion_proof, verify_inclusion, Fingerprint, Sha512Hash,
    DEFAULT_CHUNK_SIZE,
};
use resethiq_ledger::{ReceiptBuilder, TransparencyLog};

use crate::bundle::{
    Attestation, CanonicalizationSpec, ProofSection, SampledProof, SignatureBlock, SignedPayload,
    ATTESTATION_SCHEMA, PROOF_TYPE, SIGNATURE_ALGORITHM, SIGNED_PAYLOAD_SCHEMA,
};
use crate::error::{AttestError, Result};
use crate::keystore::KeyStore;
use crate::manifest::{EnvSnapshot, Manifest, Subject, ENGINE_NAME};

/// Bundle file written into the output directory.
pub const BUNDLE_FILE: &str = "attestation.json";

/// Receipt file for the attest step, adjacent to the bundle.
pub const RECEIPT_FILE: &str = "receipt.attest.json";

/// Transparency log file, adjacent to the bundle.
pub const LOG_FILE: &str = "transparency.log";

/// Options for one attestation run.
#[derive(Debug, Clone)]
pub struct AttestOptions {
    /// Chunk width partitioning the artifact into leaves.
    pub chunk_size: usize,
    /// Directory receiving the bundle, receipt, and log.
    pub out_dir: PathBuf,
    /// Directory holding (or receiving) the Ed25519 keypair.
    pub keys_dir: PathBuf,
}

impl Default for AttestOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            out_dir: PathBuf::from("out"),
            keys_dir: PathBuf::from("keys"),
        }
    }
}

/// Everything one attestation run produced.
#[derive(Debug)]
pub struct AttestOutcome {
    pub attestation: Attestation,
    pub bundle_path: PathBuf,
    pub receipt_path: PathBuf,
    pub log_path: PathBuf,
}

/// Attest an artifact: fingerprint it, sign the claims, sample proofs,
/// and persist the bundle plus its receipt and log entry.
pub fn attest_file(
    artifact: &Path,
    options: &AttestOptions,
    environment: EnvSnapshot,
) -> Result<AttestOutcome> {
    if !artifact.is_file() {
        return Err(AttestError::Config(format!(
            "artifact not found: {}",
            artifact.display()
        )));
    }
    let filename = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| artifact.display().to_string());

    let keystore = KeyStore::load_or_create(&options.keys_dir)?;
    let fingerprint = fingerprint_file(artifact, options.chunk_size)?;

    let manifest = Manifest::new(
        Subject {
            filename,
            byte_count: fingerprint.bytes,
        },
        environment.clone(),
    );
    let manifest_sha512 = Sha512Hash::hash(&canonical_json_bytes(&manifest)?);

    let claims = SignedPayload {
        schema: SIGNED_PAYLOAD_SCHEMA.to_string(),
        manifest_sha512,
        file_digests: fingerprint.file_digests,
        merkle: fingerprint.merkle.clone(),
    };

    let signed_message = canonical_json_bytes(&claims)?;
    let signed_message_sha512 = Sha512Hash::hash(&signed_message);
    let signature = keystore.sign(&signed_message);

    let attestation = Attestation {
        schema: ATTESTATION_SCHEMA.to_string(),
        manifest,
        canonicalization: CanonicalizationSpec::current(),
        proofs: ProofSection {
            proof_type: PROOF_TYPE.to_string(),
            merkle_root: fingerprint.merkle.root,
            algorithm: fingerprint.merkle.algorithm.clone(),
            sampled: sample_proofs(&fingerprint),
        },
        claims,
        signature: SignatureBlock {
            algorithm: SIGNATURE_ALGORITHM.to_string(),
            public_key_pem: keystore.public_key_pem().to_string(),
            signed_message_sha512,
            signature_b64: BASE64.encode(signature.to_bytes()),
        },
    };

    let bundle_path = write_json_atomic(&options.out_dir, BUNDLE_FILE, &attestation)?;
    tracing::debug!(bundle = %bundle_path.display(), "attestation written");

    let receipt = ReceiptBuilder::new(ENGINE_NAME, &attestation.manifest.run.id)
        .created_at(&attestation.manifest.run.created_at)
        .inputs(json!({
            "artifact": attestation.manifest.subject.filename,
            "byte_count": attestation.manifest.subject.byte_count,
            "blake2b_512": attestation.claims.file_digests.blake2b_512,
            "sha512": attestation.claims.file_digests.sha512,
        }))
        .params(json!({ "chunk_size": options.chunk_size }))
        .outputs(json!({
            "bundle": BUNDLE_FILE,
            "merkle_root": attestation.claims.merkle.root,
            "leaf_count": attestation.claims.merkle.leaf_count,
        }))
        .environment(
            serde_json::to_value(&environment)
                .map_err(|e| AttestError::MalformedBundle(e.to_string()))?,
        )
        .finalize()?;
    let receipt_path = write_json_atomic(&options.out_dir, RECEIPT_FILE, &receipt)?;

    let log = TransparencyLog::open(options.out_dir.join(LOG_FILE));
    log.append(&receipt.receipt_hash)?;

    Ok(AttestOutcome {
        attestation,
        bundle_path,
        receipt_path,
        log_path: log.path().to_path_buf(),
    })
}

/// Deterministic sampling: `{0, n/4, n/2, 3n/4, n-1}` deduplicated.
///
/// Two runs over the same artifact sample identical indices, so bundles
/// differ only in their manifest run id and timestamp.
fn sample_indices(leaf_count: u64) -> Vec<u64> {
    if leaf_count == 0 {
        return Vec::new();
    }
    let n = leaf_count;
    let candidates = [0, n / 4, n / 2, 3 * n / 4, n - 1];
    let set: BTreeSet<u64> = candidates.into_iter().collect();
    set.into_iter().collect()
}

fn sample_proofs(fingerprint: &Fingerprint) -> Vec<SampledProof> {
    let root = &fingerprint.merkle.root;
    sample_indices(fingerprint.merkle.leaf_count)
        .into_iter()
        .filter_map(|index| {
            let proof = match inclusion_proof(&fingerprint.leaves, index as usize) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(index, error = %e, "sampled proof construction failed");
                    return None;
                }
            };
            let verifies = verify_inclusion(root, &proof);
            Some(SampledProof {
                index,
                leaf_hex: proof.leaf_hash.to_hex(),
                siblings_hex: proof.siblings.iter().map(|s| s.to_hex()).collect(),
                verifies,
            })
        })
        .collect()
}

/// Serialize `value` to `dir/filename` through a temp file and atomic
/// rename. The temp file is removed on any failure.
fn write_json_atomic<T: Serialize>(dir: &Path, filename: &str, value: &T) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AttestError::MalformedBundle(e.to_string()))?;
    tmp.write_all(text.as_bytes())?;
    tmp.write_all(b"\n")?;
    tmp.flush()?;

    let path = dir.join(filename);
    tmp.persist(&path).map_err(|e| AttestError::Io(e.error))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_indices_hundred_leaves() {
        assert_eq!(sample_indices(100), vec![0, 25, 50, 75, 99]);
    }

    #[test]
    fn test_sample_indices_deduplicate() {
        assert_eq!(sample_indices(1), vec![0]);
        assert_eq!(sample_indices(2), vec![0, 1]);
        assert_eq!(sample_indices(3), vec![0, 1, 2]);
        assert_eq!(sample_indices(4), vec![0, 1, 2, 3]);
        assert_eq!(sample_indices(5), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_sample_indices_empty() {
        assert!(sample_indices(0).is_empty());
    }

    #[test]
    fn test_sample_indices_are_sorted_and_in_range() {
        for n in [6u64, 7, 9, 31, 1000] {
            let indices = sample_indices(n);
            let mut sorted = indices.clone();
            sorted.sort_unstable();
            assert_eq!(indices, sorted);
            assert!(indices.iter().all(|&i| i < n));
            assert_eq!(indices.first(), Some(&0));
            assert_eq!(indices.last(), Some(&(n - 1)));
        }
    }

    #[test]
    fn test_write_json_atomic_leaves_no_temp_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json_atomic(dir.path(), "doc.json", &serde_json::json!({"k": 1})).unwrap();
        assert!(path.exists());
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }
}
