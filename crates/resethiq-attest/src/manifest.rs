//! Manifest types: who ran, over what, in which environment.
//!
//! The environment snapshot is passed in explicitly rather than captured
//! ambiently, so tests can inject a fixed environment and assert
//! byte-identical output.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the attestation engine recorded in manifests and receipts.
pub const ENGINE_NAME: &str = "resethiq-attest";

/// Identity of the engine that produced a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineIdentity {
    pub name: String,
    pub version: String,
}

impl EngineIdentity {
    /// The identity of this build.
    pub fn current() -> Self {
        Self {
            name: ENGINE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// One attestation run: a fresh UUIDv4 and an RFC-3339 UTC timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    pub id: String,
    pub created_at: String,
}

impl RunInfo {
    /// Begin a new run, stamped now.
    pub fn begin() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// The artifact under attestation. Carries no content, only identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub filename: String,
    pub byte_count: u64,
}

/// Environment fingerprint of the emitting process. No PII.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvSnapshot {
    pub runtime: String,
    pub platform: String,
    pub arch: String,
}

impl EnvSnapshot {
    /// Snapshot the running process's environment.
    pub fn capture() -> Self {
        Self {
            runtime: format!("rust-{}", env!("CARGO_PKG_RUST_VERSION")),
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

/// The manifest carried at the top of every bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub engine: EngineIdentity,
    pub run: RunInfo,
    pub subject: Subject,
    pub environment: EnvSnapshot,
}

impl Manifest {
    /// Build a manifest for a fresh run over `subject`.
    pub fn new(subject: Subject, environment: EnvSnapshot) -> Self {
        Self {
            engine: EngineIdentity::current(),
            run: RunInfo::begin(),
            subject,
            environment,
        }
    }
}
