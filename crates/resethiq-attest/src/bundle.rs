//! Bundle wire schema: the attestation document and its sections.
//!
//! **CRITICAL**: the shapes and schema strings here are FROZEN. The
//! signed payload's canonical JSON is the signature target; any change
//! invalidates every existing bundle.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use resethiq_core::{Blake2b512Hash, FileDigests, MerkleCommitment, Sha512Hash};

use crate::error::{AttestError, Result};
use crate::manifest::Manifest;

/// Top-level bundle schema.
pub const ATTESTATION_SCHEMA: &str = "resethiq.attestation.v1";

/// Schema of the signature-covered claims.
pub const SIGNED_PAYLOAD_SCHEMA: &str = "resethiq.signed_payload.v1";

/// Proof-section type label.
pub const PROOF_TYPE: &str = "merkle_inclusion_v1";

/// Signature algorithm label.
pub const SIGNATURE_ALGORITHM: &str = "ed25519";

/// The signature-covered claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPayload {
    /// Always [`SIGNED_PAYLOAD_SCHEMA`].
    pub schema: String,
    /// SHA-512 over the canonical JSON of the bundle's manifest.
    pub manifest_sha512: Sha512Hash,
    pub file_digests: FileDigests,
    pub merkle: MerkleCommitment,
}

/// The canonicalization profile the bundle's hashes were computed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalizationSpec {
    pub spec_id: String,
    pub description: String,
}

impl CanonicalizationSpec {
    /// The profile this kernel implements.
    pub fn current() -> Self {
        Self {
            spec_id: resethiq_core::canonical::CANONICALIZATION_SPEC_ID.to_string(),
            description: resethiq_core::canonical::CANONICALIZATION_DESCRIPTION.to_string(),
        }
    }
}

/// One sampled inclusion proof, self-verified at assembly time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampledProof {
    pub index: u64,
    pub leaf_hex: String,
    pub siblings_hex: Vec<String>,
    pub verifies: bool,
}

/// The proofs section of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofSection {
    /// Always [`PROOF_TYPE`].
    #[serde(rename = "type")]
    pub proof_type: String,
    pub merkle_root: Blake2b512Hash,
    /// Always `"blake2b512"`.
    pub algorithm: String,
    pub sampled: Vec<SampledProof>,
}

/// The signature block closing a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureBlock {
    /// Always [`SIGNATURE_ALGORITHM`].
    pub algorithm: String,
    /// SPKI PEM of the signing key's public half.
    pub public_key_pem: String,
    /// SHA-512 over the canonical JSON of `claims`.
    pub signed_message_sha512: Sha512Hash,
    /// Standard base64 of the 64-byte Ed25519 signature.
    pub signature_b64: String,
}

/// A complete attestation bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attestation {
    /// Always [`ATTESTATION_SCHEMA`].
    pub schema: String,
    pub manifest: Manifest,
    pub canonicalization: CanonicalizationSpec,
    pub claims: SignedPayload,
    pub proofs: ProofSection,
    pub signature: SignatureBlock,
}

impl Attestation {
    /// Read a bundle from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let bundle: Attestation = serde_json::from_str(&text)
            .map_err(|e| AttestError::MalformedBundle(e.to_string()))?;
        if bundle.schema != ATTESTATION_SCHEMA {
            return Err(AttestError::MalformedBundle(format!(
                "unsupported schema: {}",
                bundle.schema
            )));
        }
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{EngineIdentity, EnvSnapshot, RunInfo, Subject};
    use resethiq_core::{empty_root, MERKLE_ALGORITHM};

    fn minimal_bundle() -> Attestation {
        Attestation {
            schema: ATTESTATION_SCHEMA.to_string(),
            manifest: Manifest {
                engine: EngineIdentity::current(),
                run: RunInfo {
                    id: "00000000-0000-4000-8000-000000000000".to_string(),
                    created_at: "2026-01-14T12:00:00Z".to_string(),
                },
                subject: Subject {
                    filename: "empty.bin".to_string(),
                    byte_count: 0,
                },
                environment: EnvSnapshot {
                    runtime: "rust-1.75".to_string(),
                    platform: "linux".to_string(),
                    arch: "x86_64".to_string(),
                },
            },
            canonicalization: CanonicalizationSpec::current(),
            claims: SignedPayload {
                schema: SIGNED_PAYLOAD_SCHEMA.to_string(),
                manifest_sha512: Sha512Hash::hash(b"manifest"),
                file_digests: resethiq_core::FileDigests {
                    blake2b_512: Blake2b512Hash::hash(b""),
                    sha512: Sha512Hash::hash(b""),
                },
                merkle: MerkleCommitment {
                    algorithm: MERKLE_ALGORITHM.to_string(),
                    root: empty_root(),
                    leaf_count: 0,
                    chunk_size: 4 * 1024 * 1024,
                },
            },
            proofs: ProofSection {
                proof_type: PROOF_TYPE.to_string(),
                merkle_root: empty_root(),
                algorithm: MERKLE_ALGORITHM.to_string(),
                sampled: Vec::new(),
            },
            signature: SignatureBlock {
                algorithm: SIGNATURE_ALGORITHM.to_string(),
                public_key_pem: "-----BEGIN PUBLIC KEY-----\n-----END PUBLIC KEY-----\n"
                    .to_string(),
                signed_message_sha512: Sha512Hash::hash(b"claims"),
                signature_b64: "AA==".to_string(),
            },
        }
    }

    #[test]
    fn test_json_roundtrip() {
        let bundle = minimal_bundle();
        let text = serde_json::to_string_pretty(&bundle).unwrap();
        let back: Attestation = serde_json::from_str(&text).unwrap();
        assert_eq!(bundle, back);
    }

    #[test]
    fn test_proof_type_serializes_as_type() {
        let bundle = minimal_bundle();
        let value = serde_json::to_value(&bundle).unwrap();
        assert_eq!(value["proofs"]["type"], PROOF_TYPE);
    }

    #[test]
    fn test_hashes_serialize_as_lowercase_hex() {
        let bundle = minimal_bundle();
        let value = serde_json::to_value(&bundle).unwrap();
        let root = value["claims"]["merkle"]["root"].as_str().unwrap();
        assert_eq!(root.len(), 128);
        assert!(root.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
