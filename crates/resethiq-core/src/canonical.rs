//! Canonical serialization for deterministic hashing.
//!
//! Two encoders live here:
//!
//! - [`canonical_record`] maps a structured record (one row of a tabular
//!   artifact) to a single byte sequence, joined by the unit separator.
//! - [`canonical_json`] encodes a JSON tree with byte-sorted object keys,
//!   no whitespace, and minimal escapes. Every signature-covered structure
//!   (manifest, signed payload, receipt) is hashed over this encoding.
//!
//! **CRITICAL**: Both encodings are FROZEN. Changes break all existing
//! bundle hashes and signatures.

use serde::Serialize;
use serde_json::Value;
use std::fmt::Write as _;

use crate::error::CanonicalizationError;

/// Identifier of the canonicalization profile carried in bundles.
pub const CANONICALIZATION_SPEC_ID: &str = "cdr-stream-v1";

/// Human-readable description of the profile, carried alongside the id.
pub const CANONICALIZATION_DESCRIPTION: &str = "unit-separator joined record fields; \
     canonical JSON with byte-sorted keys for structured documents";

/// Field separator for record canonicalization (ASCII unit separator).
pub const UNIT_SEPARATOR: u8 = 0x1F;

/// A structured record ready for canonicalization.
///
/// Rows parsed from a tabular artifact arrive in one of two shapes:
/// an ordered sequence of cells, or a key-value mapping. The tag decides
/// which canonicalization rule applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// An ordered sequence of values. `None` marks an absent cell.
    Positional(Vec<Option<String>>),
    /// A key-value mapping. Keys are sorted by byte order on encode.
    Keyed(Vec<(String, Option<String>)>),
}

/// Encode a record to its canonical byte sequence.
///
/// Positional records stringify each value (empty string for absent) and
/// join with `0x1F`. Keyed records sort pairs by key byte order and emit
/// `key "=" value` joined the same way.
pub fn canonical_record(record: &Record) -> Vec<u8> {
    let mut out = Vec::new();
    match record {
        Record::Positional(values) => {
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    out.push(UNIT_SEPARATOR);
                }
                if let Some(v) = value {
                    out.extend_from_slice(v.as_bytes());
                }
            }
        }
        Record::Keyed(pairs) => {
            let mut sorted: Vec<&(String, Option<String>)> = pairs.iter().collect();
            sorted.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
            for (i, (key, value)) in sorted.iter().map(|p| (&p.0, &p.1)).enumerate() {
                if i > 0 {
                    out.push(UNIT_SEPARATOR);
                }
                out.extend_from_slice(key.as_bytes());
                out.push(b'=');
                if let Some(v) = value {
                    out.extend_from_slice(v.as_bytes());
                }
            }
        }
    }
    out
}

/// Encode a JSON tree to its canonical string form.
///
/// Objects emit keys in byte order, arrays preserve order, and no
/// whitespace is produced. Numbers use serde_json's shortest form, which
/// round-trips exactly.
pub fn canonical_json(value: &Value) -> Result<String, CanonicalizationError> {
    let mut out = String::new();
    write_value(&mut out, value)?;
    Ok(out)
}

/// Canonical JSON bytes of any serializable value.
///
/// This is the only path to signature-covered bytes: callers must never
/// hash the output of a general-purpose serializer.
pub fn canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, CanonicalizationError> {
    let tree = serde_json::to_value(value)
        .map_err(|e| CanonicalizationError::Encoding(e.to_string()))?;
    Ok(canonical_json(&tree)?.into_bytes())
}

fn write_value(out: &mut String, value: &Value) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                if n.as_u64().is_none() && n.as_i64().is_none() && !f.is_finite() {
                    return Err(CanonicalizationError::NonFinite);
                }
            }
            // serde_json's Display for Number is its serialized form.
            write!(out, "{}", n).map_err(|e| CanonicalizationError::Encoding(e.to_string()))?;
        }
        Value::String(s) => write_escaped(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_by(|a, b| a.as_bytes().cmp(b.as_bytes()));
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_escaped(out, key);
                out.push(':');
                write_value(out, &map[*key])?;
            }
            out.push('}');
        }
    }
    Ok(())
}

/// Minimal JSON string escape: only the escapes the grammar requires.
fn write_escaped(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
