//! Golden test vectors pinning the wire contract.
//!
//! Every implementation of the kernel must reproduce these digests and
//! roots exactly. A divergence here means bundles signed by one build
//! will not verify under another.

use resethiq_core::{fingerprint_reader, Blake2b512Hash};

/// A golden fingerprint vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// The artifact bytes.
    pub input: &'static [u8],
    /// Chunk width partitioning the input.
    pub chunk_size: usize,
    /// Expected leaf count.
    pub leaf_count: u64,
    /// Expected Merkle root (hex).
    pub root_hex: &'static str,
    /// Expected BLAKE2b-512 file digest (hex).
    pub blake2b_hex: &'static str,
    /// Expected SHA-512 file digest (hex).
    pub sha512_hex: &'static str,
}

/// Get all golden vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "empty artifact",
            input: b"",
            chunk_size: 4,
            leaf_count: 0,
            // BLAKE2b-512("resethiq:empty"), the empty-tree sentinel.
            root_hex: "38fb1a741cd425e8cbb7f862dd6c0f7f8745150f2bc6f4dcf1ef20b77b0b52a8\
                       5f39d5b6bea169b29b623be4dc7cd9c0a23a30bec770f59e75b69eb8c12d5304",
            blake2b_hex: "786a02f742015903c6c6fd852552d272912f4740e15847618a86e217f71f5419\
                          d25e1031afee585313896444934eb04b903a685b1448b755d56f701afe9be2ce",
            sha512_hex: "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce\
                         47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e",
        },
        GoldenVector {
            name: "abc in a single oversized chunk",
            input: b"abc",
            chunk_size: 1024,
            leaf_count: 1,
            // Single-leaf root is the leaf itself: BLAKE2b-512("abc").
            root_hex: "ba80a53f981c4d0d6a2797b69f12f6e94c212f14685ac4b74b12bb6fdbffa2d1\
                       7d87c5392aab792dc252d5de4533cc9518d38aa8dbf1925ab92386edd4009923",
            blake2b_hex: "ba80a53f981c4d0d6a2797b69f12f6e94c212f14685ac4b74b12bb6fdbffa2d1\
                          7d87c5392aab792dc252d5de4533cc9518d38aa8dbf1925ab92386edd4009923",
            sha512_hex: "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
                         2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f",
        },
        GoldenVector {
            name: "abc as three one-byte leaves (odd level)",
            input: b"abc",
            chunk_size: 1,
            leaf_count: 3,
            root_hex: "1db4becc73885cc1b2c7d8f9df2a688255dfaccbedc0613d3d7748f2b5df3296\
                       87cf2db8cc1912748ac1f19696bcebf4e297e48607015e141a4f2adc66964753",
            blake2b_hex: "ba80a53f981c4d0d6a2797b69f12f6e94c212f14685ac4b74b12bb6fdbffa2d1\
                          7d87c5392aab792dc252d5de4533cc9518d38aa8dbf1925ab92386edd4009923",
            sha512_hex: "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
                         2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f",
        },
        GoldenVector {
            name: "eight zero bytes with a short final leaf",
            input: &[0u8; 8],
            chunk_size: 3,
            leaf_count: 3,
            root_hex: "6bd1ef36581805e3494cf0cdc217ca07573f4680e8adb14838b960c2125cd264\
                       f24e0c27c5df5b5612c97138b7e1a97fdc597ff7fb5f3580db4292f02d95afae",
            blake2b_hex: "482ae5a29fbe856c7272f2071b8b0f0359ee2d89ff392b8a900643fbd0836ecc\
                          d067b8bf41909e206c90d45d6e7d8b6686b93ecaee5fe1a9060d87b672101310",
            sha512_hex: "1b7409ccf0d5a34d3a77eaabfa9fe27427655be9297127ee9522aa1bf4046d4f\
                         945983678169cb1a7348edcac47ef0d9e2c924130e5bcc5f0d94937852c42f1b",
        },
    ]
}

/// Fingerprint a vector's input and compare every expected value.
pub fn verify_vector(vector: &GoldenVector) -> bool {
    let fp = match fingerprint_reader(vector.input, vector.chunk_size) {
        Ok(fp) => fp,
        Err(_) => return false,
    };
    fp.merkle.leaf_count == vector.leaf_count
        && fp.merkle.root == expected_hash(vector.root_hex)
        && fp.file_digests.blake2b_512 == expected_hash(vector.blake2b_hex)
        && fp.file_digests.sha512.to_hex() == normalize(vector.sha512_hex)
}

fn expected_hash(hex: &str) -> Blake2b512Hash {
    Blake2b512Hash::from_hex(&normalize(hex)).expect("vector hex is valid")
}

fn normalize(hex: &str) -> String {
    hex.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_pass() {
        for vector in all_vectors() {
            assert!(verify_vector(&vector), "vector '{}' diverged", vector.name);
        }
    }

    #[test]
    fn test_vectors_are_stable_across_runs() {
        for vector in all_vectors() {
            let a = fingerprint_reader(vector.input, vector.chunk_size).unwrap();
            let b = fingerprint_reader(vector.input, vector.chunk_size).unwrap();
            assert_eq!(a.merkle.root, b.merkle.root, "vector '{}'", vector.name);
            assert_eq!(a.leaves, b.leaves, "vector '{}'", vector.name);
        }
    }
}
