//! Ed25519 key store.
//!
//! `load_or_create` is the only entry point: it either reads an existing
//! SPKI/PKCS#8 PEM pair or generates a fresh keypair and persists it.
//! Cold starts run under an exclusive file lock so two concurrent
//! processes cannot generate and clobber different keypairs. Key files
//! are never rewritten once present.

use ed25519_dalek::pkcs8::{
    DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey,
};
use pkcs8::LineEnding;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use fs2::FileExt;
use rand::rngs::OsRng;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::KeyStoreError;

/// SPKI PEM file holding the public key.
pub const PUBLIC_KEY_FILE: &str = "ed25519_public.pem";

/// PKCS#8 PEM file holding the private key (mode `0600` where supported).
pub const PRIVATE_KEY_FILE: &str = "ed25519_private.pem";

const LOCK_FILE: &str = ".keystore.lock";

/// A loaded signing identity.
pub struct KeyStore {
    dir: PathBuf,
    signing_key: SigningKey,
    public_key_pem: String,
}

impl KeyStore {
    /// Load the keypair from `dir`, generating and persisting one if the
    /// directory holds none.
    pub fn load_or_create(dir: &Path) -> Result<Self, KeyStoreError> {
        fs::create_dir_all(dir).map_err(|e| KeyStoreError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let lock_path = dir.join(LOCK_FILE);
        let lock = File::create(&lock_path).map_err(|e| KeyStoreError::Io {
            path: lock_path.clone(),
            source: e,
        })?;
        lock.lock_exclusive().map_err(|e| KeyStoreError::Io {
            path: lock_path,
            source: e,
        })?;

        // Lock held for the whole read-or-generate decision; released on
        // drop of `lock`.
        let public_path = dir.join(PUBLIC_KEY_FILE);
        let private_path = dir.join(PRIVATE_KEY_FILE);

        if public_path.exists() && private_path.exists() {
            Self::read_existing(dir, &public_path, &private_path)
        } else {
            Self::generate(dir, &public_path, &private_path)
        }
    }

    fn read_existing(
        dir: &Path,
        public_path: &Path,
        private_path: &Path,
    ) -> Result<Self, KeyStoreError> {
        let private_pem = fs::read_to_string(private_path).map_err(|e| KeyStoreError::Io {
            path: private_path.to_path_buf(),
            source: e,
        })?;
        let signing_key =
            SigningKey::from_pkcs8_pem(&private_pem).map_err(|e| KeyStoreError::Malformed {
                path: private_path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let public_pem = fs::read_to_string(public_path).map_err(|e| KeyStoreError::Io {
            path: public_path.to_path_buf(),
            source: e,
        })?;
        let stored_public =
            VerifyingKey::from_public_key_pem(&public_pem).map_err(|e| KeyStoreError::Malformed {
                path: public_path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if stored_public != signing_key.verifying_key() {
            return Err(KeyStoreError::KeyMismatch {
                dir: dir.to_path_buf(),
            });
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            signing_key,
            public_key_pem: public_pem,
        })
    }

    fn generate(
        dir: &Path,
        public_path: &Path,
        private_path: &Path,
    ) -> Result<Self, KeyStoreError> {
        let signing_key = SigningKey::generate(&mut OsRng);

        let private_pem = signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| KeyStoreError::Generation(e.to_string()))?;
        let public_pem = signing_key
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyStoreError::Generation(e.to_string()))?;

        write_new(private_path, private_pem.as_bytes(), true)?;
        write_new(public_path, public_pem.as_bytes(), false)?;
        tracing::info!(dir = %dir.display(), "generated new ed25519 keypair");

        Ok(Self {
            dir: dir.to_path_buf(),
            signing_key,
            public_key_pem: public_pem,
        })
    }

    /// The directory this store lives in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The public key in SPKI PEM form, exactly as stored on disk.
    pub fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }

    /// The public half of the keypair.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Sign a message with the stored private key.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

/// Write a fresh key file; refuses to overwrite an existing one.
fn write_new(path: &Path, contents: &[u8], private: bool) -> Result<(), KeyStoreError> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    if private {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    #[cfg(not(unix))]
    let _ = private;

    let mut file = options.open(path).map_err(|e| KeyStoreError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    file.write_all(contents).map_err(|e| KeyStoreError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::Verifier;
    use tempfile::tempdir;

    #[test]
    fn test_cold_start_creates_both_pems() {
        let dir = tempdir().unwrap();
        let store = KeyStore::load_or_create(dir.path()).unwrap();
        assert!(dir.path().join(PUBLIC_KEY_FILE).exists());
        assert!(dir.path().join(PRIVATE_KEY_FILE).exists());
        assert!(store.public_key_pem().contains("BEGIN PUBLIC KEY"));
    }

    #[test]
    fn test_reload_returns_same_key() {
        let dir = tempdir().unwrap();
        let first = KeyStore::load_or_create(dir.path()).unwrap();
        let second = KeyStore::load_or_create(dir.path()).unwrap();
        assert_eq!(first.verifying_key(), second.verifying_key());
        assert_eq!(first.public_key_pem(), second.public_key_pem());
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let dir = tempdir().unwrap();
        let store = KeyStore::load_or_create(dir.path()).unwrap();
        let message = b"payload bytes";
        let signature = store.sign(message);
        assert!(store.verifying_key().verify(message, &signature).is_ok());
    }

    #[test]
    fn test_mismatched_public_key_rejected() {
        let dir = tempdir().unwrap();
        KeyStore::load_or_create(dir.path()).unwrap();

        // Replace the public pem with a different key's.
        let other = SigningKey::generate(&mut OsRng);
        let other_pem = other
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .unwrap();
        fs::write(dir.path().join(PUBLIC_KEY_FILE), other_pem).unwrap();

        let result = KeyStore::load_or_create(dir.path());
        assert!(matches!(result, Err(KeyStoreError::KeyMismatch { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_private_key_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        KeyStore::load_or_create(dir.path()).unwrap();
        let meta = fs::metadata(dir.path().join(PRIVATE_KEY_FILE)).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn test_garbage_private_pem_rejected() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(PRIVATE_KEY_FILE), "not a pem").unwrap();
        fs::write(dir.path().join(PUBLIC_KEY_FILE), "not a pem").unwrap();
        let result = KeyStore::load_or_create(dir.path());
        assert!(matches!(result, Err(KeyStoreError::Malformed { .. })));
    }
}
