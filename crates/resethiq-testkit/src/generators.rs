//! Proptest generators for property-based testing.

use proptest::prelude::*;

use resethiq_core::{Blake2b512Hash, Record};

/// Generate a chunk size small enough to exercise multi-leaf trees.
pub fn chunk_size() -> impl Strategy<Value = usize> {
    1usize..=64
}

/// Generate artifact bytes up to `max_len`.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a random leaf hash.
pub fn leaf_hash() -> impl Strategy<Value = Blake2b512Hash> {
    payload(32).prop_map(|bytes| Blake2b512Hash::hash(&bytes))
}

/// Generate a non-empty leaf set.
pub fn leaves(max_len: usize) -> impl Strategy<Value = Vec<Blake2b512Hash>> {
    prop::collection::vec(leaf_hash(), 1..=max_len)
}

/// Generate a cell value: absent, empty, or short text.
pub fn cell() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        "[a-z0-9 ]{1,16}".prop_map(Some),
    ]
}

/// Generate a positional or keyed record.
pub fn record() -> impl Strategy<Value = Record> {
    prop_oneof![
        prop::collection::vec(cell(), 0..8).prop_map(Record::Positional),
        prop::collection::vec(("[a-z]{1,8}", cell()), 0..8).prop_map(Record::Keyed),
    ]
}

/// Generate a small JSON tree for canonicalization properties.
pub fn json_value() -> impl Strategy<Value = serde_json::Value> {
    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::from),
        any::<i64>().prop_map(serde_json::Value::from),
        "[a-zA-Z0-9 \\\\\"\n\t]{0,12}".prop_map(serde_json::Value::from),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::from),
            prop::collection::btree_map("[a-zA-Z]{1,6}", inner, 0..4)
                .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
        ]
    })
}
