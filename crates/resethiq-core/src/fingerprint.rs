//! Streaming content fingerprinter.
//!
//! One pass over the artifact produces the file-level digests, the ordered
//! leaf hashes, and the Merkle commitment over them. Memory stays bounded:
//! the accumulator never holds more than one transport read plus one
//! partial chunk, and only the leaves vector grows with input size.

use blake2::{Blake2b512, Digest};
use bytes::BytesMut;
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::canonical::{canonical_record, Record};
use crate::digest::{Blake2b512Hash, Sha512Hash};
use crate::error::{CoreError, Result};
use crate::merkle::{self, MERKLE_ALGORITHM};

/// Default chunk width partitioning the byte stream into leaves: 4 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Transport read size for the streaming pass.
const READ_SIZE: usize = 1024 * 1024;

/// Dual digests over the raw byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDigests {
    pub blake2b_512: Blake2b512Hash,
    pub sha512: Sha512Hash,
}

/// The Merkle commitment carried in claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleCommitment {
    /// Always `"blake2b512"`.
    pub algorithm: String,
    pub root: Blake2b512Hash,
    pub leaf_count: u64,
    /// The fixed chunk width that partitioned the stream.
    pub chunk_size: u64,
}

/// The full result of fingerprinting an artifact.
#[derive(Debug, Clone)]
pub struct Fingerprint {
    /// Total bytes consumed.
    pub bytes: u64,
    /// Number of chunks (equals `leaves.len()`).
    pub chunks: u64,
    /// Leaf hashes in stream order.
    pub leaves: Vec<Blake2b512Hash>,
    pub file_digests: FileDigests,
    pub merkle: MerkleCommitment,
}

/// Fingerprint a byte stream with the given chunk width.
///
/// A zero-byte stream yields zero leaves and the empty-tree sentinel
/// root. A chunk width larger than the stream yields exactly one leaf.
pub fn fingerprint_reader<R: Read>(mut reader: R, chunk_size: usize) -> Result<Fingerprint> {
    if chunk_size == 0 {
        return Err(CoreError::NonPositiveChunkSize);
    }

    let mut blake = Blake2b512::new();
    let mut sha = Sha512::new();
    let mut pending = BytesMut::new();
    let mut leaves = Vec::new();
    let mut total: u64 = 0;
    let mut buf = vec![0u8; READ_SIZE];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(CoreError::Io(e)),
        };
        let read = &buf[..n];
        blake.update(read);
        sha.update(read);
        pending.extend_from_slice(read);
        total += n as u64;

        while pending.len() >= chunk_size {
            let chunk = pending.split_to(chunk_size);
            leaves.push(Blake2b512Hash::hash(&chunk));
        }
    }

    if !pending.is_empty() {
        leaves.push(Blake2b512Hash::hash(&pending));
    }

    let mut blake_out = [0u8; 64];
    blake_out.copy_from_slice(&blake.finalize());
    let mut sha_out = [0u8; 64];
    sha_out.copy_from_slice(&sha.finalize());

    let root = merkle::merkle_root(&leaves);
    tracing::debug!(bytes = total, leaves = leaves.len(), "fingerprint complete");

    Ok(Fingerprint {
        bytes: total,
        chunks: leaves.len() as u64,
        merkle: MerkleCommitment {
            algorithm: MERKLE_ALGORITHM.to_string(),
            root,
            leaf_count: leaves.len() as u64,
            chunk_size: chunk_size as u64,
        },
        file_digests: FileDigests {
            blake2b_512: Blake2b512Hash::from_bytes(blake_out),
            sha512: Sha512Hash::from_bytes(sha_out),
        },
        leaves,
    })
}

/// Fingerprint a file on disk.
pub fn fingerprint_file(path: &Path, chunk_size: usize) -> Result<Fingerprint> {
    let file = File::open(path)?;
    fingerprint_reader(BufReader::with_capacity(READ_SIZE, file), chunk_size)
}

/// Derive the leaf hash of one canonicalized record.
///
/// Engines that commit to parsed rows instead of raw chunks feed these
/// leaves straight into the Merkle engine; the tree algorithms are
/// identical either way.
pub fn record_leaf(record: &Record) -> Blake2b512Hash {
    Blake2b512Hash::hash(&canonical_record(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_zero_chunk_size_rejected() {
        let result = fingerprint_reader(Cursor::new(b"data"), 0);
        assert!(matches!(result, Err(CoreError::NonPositiveChunkSize)));
    }

    #[test]
    fn test_empty_stream() {
        let fp = fingerprint_reader(Cursor::new(b""), 4).unwrap();
        assert_eq!(fp.bytes, 0);
        assert_eq!(fp.chunks, 0);
        assert!(fp.leaves.is_empty());
        assert_eq!(fp.merkle.root, merkle::empty_root());
        assert_eq!(
            fp.file_digests.sha512.to_hex(),
            "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce\
             47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e"
        );
    }

    #[test]
    fn test_leaf_count_matches_ceil_division() {
        for (len, chunk, expected) in [
            (1usize, 4usize, 1u64),
            (4, 4, 1),
            (5, 4, 2),
            (8, 4, 2),
            (9, 4, 3),
            (100, 7, 15),
        ] {
            let data = vec![0xabu8; len];
            let fp = fingerprint_reader(Cursor::new(data), chunk).unwrap();
            assert_eq!(fp.chunks, expected, "len={} chunk={}", len, chunk);
            assert_eq!(fp.merkle.leaf_count, expected);
            assert_eq!(fp.bytes, len as u64);
        }
    }

    #[test]
    fn test_oversized_chunk_yields_single_leaf() {
        let fp = fingerprint_reader(Cursor::new(b"tiny"), 1024).unwrap();
        assert_eq!(fp.chunks, 1);
        assert_eq!(fp.leaves[0], Blake2b512Hash::hash(b"tiny"));
        // A single-leaf tree's root is the leaf itself.
        assert_eq!(fp.merkle.root, fp.leaves[0]);
    }

    #[test]
    fn test_leaves_are_chunk_hashes_in_order() {
        let data = b"abcdefgh!";
        let fp = fingerprint_reader(Cursor::new(data), 4).unwrap();
        assert_eq!(fp.leaves.len(), 3);
        assert_eq!(fp.leaves[0], Blake2b512Hash::hash(b"abcd"));
        assert_eq!(fp.leaves[1], Blake2b512Hash::hash(b"efgh"));
        assert_eq!(fp.leaves[2], Blake2b512Hash::hash(b"!"));
    }

    #[test]
    fn test_file_digests_cover_raw_stream() {
        let fp = fingerprint_reader(Cursor::new(b"abc"), 1).unwrap();
        assert_eq!(fp.file_digests.blake2b_512, Blake2b512Hash::hash(b"abc"));
        assert_eq!(fp.file_digests.sha512, Sha512Hash::hash(b"abc"));
    }

    #[test]
    fn test_record_leaf_hashes_canonical_bytes() {
        let record = Record::Keyed(vec![
            ("b".to_string(), Some("2".to_string())),
            ("a".to_string(), Some("1".to_string())),
        ]);
        assert_eq!(record_leaf(&record), Blake2b512Hash::hash(b"a=1\x1fb=2"));
    }

    #[test]
    fn test_chunking_is_read_size_independent() {
        // The same stream split across many small reads must produce the
        // same leaves as one large read.
        struct Dribble<'a>(&'a [u8]);
        impl Read for Dribble<'_> {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                let n = self.0.len().min(3).min(buf.len());
                buf[..n].copy_from_slice(&self.0[..n]);
                self.0 = &self.0[n..];
                Ok(n)
            }
        }

        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let whole = fingerprint_reader(Cursor::new(data.clone()), 64).unwrap();
        let dribbled = fingerprint_reader(Dribble(&data), 64).unwrap();
        assert_eq!(whole.leaves, dribbled.leaves);
        assert_eq!(whole.merkle.root, dribbled.merkle.root);
        assert_eq!(whole.file_digests, dribbled.file_digests);
    }
}
