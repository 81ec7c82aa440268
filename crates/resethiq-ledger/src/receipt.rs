//! Receipt: the self-hashing descriptor of one engine step.
//!
//! A receipt is immutable once emitted. Its `receipt_hash` covers the
//! canonical JSON of every other field, so any edit is detectable, and
//! chains form by pointing `prev_receipt_hash` at the predecessor.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

use resethiq_core::canonical::canonical_json;
use resethiq_core::{CanonicalizationError, Sha256Hash};

use crate::error::{LedgerError, Result};

/// The current receipt schema version.
pub const RECEIPT_VERSION: &str = "resethiq.receipt.v1";

/// A complete engine-step receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// Schema version string.
    pub version: String,

    /// Name of the engine that ran this step.
    pub engine: String,

    /// Run identifier shared by every step of one pipeline run.
    pub run_id: String,

    /// RFC-3339 UTC timestamp of emission.
    pub created_at: String,

    /// What the step consumed (paths, digests, upstream roots).
    pub inputs: Value,

    /// The parameters the step ran with.
    pub params: Value,

    /// What the step produced.
    pub outputs: Value,

    /// Environment fingerprint of the emitting process.
    pub environment: Value,

    /// Hash of the previous step's receipt, absent for the first step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_receipt_hash: Option<String>,

    /// SHA-256 hex over the canonical JSON of all other fields.
    pub receipt_hash: String,
}

impl Receipt {
    /// Recompute the hash over all fields except `receipt_hash` and
    /// compare with the stored value.
    pub fn verify_hash(&self) -> Result<bool> {
        let computed = hash_receipt_value(&to_unsigned_value(self)?)?;
        Ok(computed == self.receipt_hash)
    }

    /// Check that this receipt chains from `prev`.
    pub fn chains_from(&self, prev: &Receipt) -> bool {
        self.prev_receipt_hash.as_deref() == Some(prev.receipt_hash.as_str())
    }

    /// Read a receipt from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| LedgerError::MalformedReceipt(e.to_string()))
    }
}

/// Serialize a receipt minus its `receipt_hash` field.
fn to_unsigned_value(receipt: &Receipt) -> Result<Value> {
    let mut value = serde_json::to_value(receipt)
        .map_err(|e| CanonicalizationError::Encoding(e.to_string()))?;
    if let Value::Object(map) = &mut value {
        map.remove("receipt_hash");
    }
    Ok(value)
}

fn hash_receipt_value(unsigned: &Value) -> Result<String> {
    let canon = canonical_json(unsigned)?;
    Ok(Sha256Hash::hash(canon.as_bytes()).to_hex())
}

/// Builder for emitting receipts.
pub struct ReceiptBuilder {
    engine: String,
    run_id: String,
    created_at: String,
    inputs: Value,
    params: Value,
    outputs: Value,
    environment: Value,
    prev_receipt_hash: Option<String>,
}

impl ReceiptBuilder {
    /// Start a receipt for one engine step. `created_at` defaults to now.
    pub fn new(engine: &str, run_id: &str) -> Self {
        Self {
            engine: engine.to_string(),
            run_id: run_id.to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            inputs: Value::Null,
            params: Value::Null,
            outputs: Value::Null,
            environment: Value::Null,
            prev_receipt_hash: None,
        }
    }

    /// Override the emission timestamp (RFC-3339 UTC).
    pub fn created_at(mut self, ts: &str) -> Self {
        self.created_at = ts.to_string();
        self
    }

    /// Set the inputs section.
    pub fn inputs(mut self, v: Value) -> Self {
        self.inputs = v;
        self
    }

    /// Set the params section.
    pub fn params(mut self, v: Value) -> Self {
        self.params = v;
        self
    }

    /// Set the outputs section.
    pub fn outputs(mut self, v: Value) -> Self {
        self.outputs = v;
        self
    }

    /// Set the environment fingerprint.
    pub fn environment(mut self, v: Value) -> Self {
        self.environment = v;
        self
    }

    /// Link to the previous step's receipt hash.
    pub fn prev(mut self, hash: &str) -> Self {
        self.prev_receipt_hash = Some(hash.to_string());
        self
    }

    /// Compute the receipt hash and seal the receipt.
    pub fn finalize(self) -> Result<Receipt> {
        let mut receipt = Receipt {
            version: RECEIPT_VERSION.to_string(),
            engine: self.engine,
            run_id: self.run_id,
            created_at: self.created_at,
            inputs: self.inputs,
            params: self.params,
            outputs: self.outputs,
            environment: self.environment,
            prev_receipt_hash: self.prev_receipt_hash,
            receipt_hash: String::new(),
        };
        receipt.receipt_hash = hash_receipt_value(&to_unsigned_value(&receipt)?)?;
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_receipt(prev: Option<&str>) -> Receipt {
        let mut builder = ReceiptBuilder::new("fingerprinter", "run-1")
            .created_at("2026-01-14T12:00:00Z")
            .inputs(json!({"artifact": "data.csv", "bytes": 1024}))
            .params(json!({"chunk_size": 256}))
            .outputs(json!({"leaf_count": 4}))
            .environment(json!({"platform": "linux", "arch": "x86_64"}));
        if let Some(p) = prev {
            builder = builder.prev(p);
        }
        builder.finalize().unwrap()
    }

    #[test]
    fn test_receipt_hash_verifies() {
        let receipt = make_receipt(None);
        assert_eq!(receipt.receipt_hash.len(), 64);
        assert!(receipt.verify_hash().unwrap());
    }

    #[test]
    fn test_receipt_hash_is_deterministic() {
        let a = make_receipt(None);
        let b = make_receipt(None);
        assert_eq!(a.receipt_hash, b.receipt_hash);
    }

    #[test]
    fn test_tampered_receipt_fails_verification() {
        let mut receipt = make_receipt(None);
        receipt.outputs = json!({"leaf_count": 5});
        assert!(!receipt.verify_hash().unwrap());
    }

    #[test]
    fn test_chain_linkage() {
        let first = make_receipt(None);
        let second = make_receipt(Some(&first.receipt_hash));
        assert!(second.chains_from(&first));
        assert!(!first.chains_from(&second));
        // Linking changes the hash.
        assert_ne!(first.receipt_hash, second.receipt_hash);
    }

    #[test]
    fn test_prev_hash_omitted_when_absent() {
        let receipt = make_receipt(None);
        let json = serde_json::to_string(&receipt).unwrap();
        assert!(!json.contains("prev_receipt_hash"));
    }

    #[test]
    fn test_json_roundtrip_preserves_hash() {
        let receipt = make_receipt(None);
        let text = serde_json::to_string(&receipt).unwrap();
        let back: Receipt = serde_json::from_str(&text).unwrap();
        assert_eq!(receipt, back);
        assert!(back.verify_hash().unwrap());
    }
}
