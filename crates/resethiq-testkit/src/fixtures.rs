//! Test fixtures: scratch workspaces with a pinned environment.

use std::path::PathBuf;

use resethiq_attest::{AttestOptions, EnvSnapshot};

/// A scratch workspace for attestation tests.
///
/// Holds a temp directory with `artifacts/`, `out/`, and `keys/`
/// subdirectories, plus a fixed environment snapshot so manifests are
/// reproducible.
pub struct TestFixture {
    dir: tempfile::TempDir,
}

impl TestFixture {
    /// Create a fresh workspace.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp workspace"),
        }
    }

    /// Write an artifact into the workspace and return its path.
    pub fn write_artifact(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let dir = self.dir.path().join("artifacts");
        std::fs::create_dir_all(&dir).expect("create artifacts dir");
        let path = dir.join(name);
        std::fs::write(&path, bytes).expect("write artifact");
        path
    }

    /// Attestation options pointing at this workspace's `out/` and
    /// `keys/` directories.
    pub fn attest_options(&self, chunk_size: usize) -> AttestOptions {
        AttestOptions {
            chunk_size,
            out_dir: self.dir.path().join("out"),
            keys_dir: self.dir.path().join("keys"),
        }
    }

    /// The workspace root.
    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// A pinned environment snapshot for reproducible manifests.
    pub fn fixed_env() -> EnvSnapshot {
        EnvSnapshot {
            runtime: "rust-1.75-test".to_string(),
            platform: "linux".to_string(),
            arch: "x86_64".to_string(),
        }
    }

    /// Deterministic pseudo-random bytes (xorshift), no RNG dependency.
    pub fn patterned_bytes(len: usize, seed: u64) -> Vec<u8> {
        let mut state = seed | 1;
        let mut out = Vec::with_capacity(len);
        while out.len() < len {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let bytes = state.to_le_bytes();
            let take = bytes.len().min(len - out.len());
            out.extend_from_slice(&bytes[..take]);
        }
        out
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_roundtrip() {
        let fixture = TestFixture::new();
        let path = fixture.write_artifact("a.bin", b"abc");
        assert_eq!(std::fs::read(path).unwrap(), b"abc");
    }

    #[test]
    fn test_patterned_bytes_deterministic() {
        let a = TestFixture::patterned_bytes(1000, 7);
        let b = TestFixture::patterned_bytes(1000, 7);
        let c = TestFixture::patterned_bytes(1000, 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 1000);
    }
}
