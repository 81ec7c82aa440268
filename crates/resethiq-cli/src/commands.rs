//! Command implementations. Every command prints exactly one JSON
//! document on stdout; diagnostics go to stderr via tracing.

use serde_json::json;
use std::path::Path;

use resethiq_attest::{
    attest_file, verify_bundle, AttestError, AttestOptions, Attestation, EnvSnapshot,
};
use resethiq_core::{fingerprint_file, CoreError};
use resethiq_ledger::TransparencyLog;

use crate::{Commands, LogCommands};

/// Dispatch a parsed command and return the process exit code.
pub fn run(command: Commands) -> i32 {
    let result = match command {
        Commands::Hash { file, chunk } => run_hash(&file, chunk),
        Commands::Attest {
            file,
            chunk,
            out,
            keys,
        } => run_attest(&file, chunk, out, keys),
        Commands::Verify { bundle, file } => run_verify(&bundle, &file),
        Commands::Log {
            command: LogCommands::Verify { log },
        } => run_log_verify(&log),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            exit_code(&e)
        }
    }
}

fn exit_code(err: &AttestError) -> i32 {
    match err {
        AttestError::Config(_) => 1,
        AttestError::Core(CoreError::NonPositiveChunkSize) => 1,
        _ => 2,
    }
}

fn require_file(path: &Path) -> Result<(), AttestError> {
    if !path.is_file() {
        return Err(AttestError::Config(format!(
            "no such file: {}",
            path.display()
        )));
    }
    Ok(())
}

fn run_hash(file: &Path, chunk: usize) -> Result<i32, AttestError> {
    require_file(file)?;
    let fp = fingerprint_file(file, chunk)?;
    let doc = json!({
        "file": file.display().to_string(),
        "bytes": fp.bytes,
        "chunks_count": fp.chunks,
        "leaf_hexes": fp.leaves.iter().map(|l| l.to_hex()).collect::<Vec<_>>(),
        "file_digests": fp.file_digests,
        "merkle": fp.merkle,
    });
    println!("{doc}");
    Ok(0)
}

fn run_attest(
    file: &Path,
    chunk: usize,
    out: std::path::PathBuf,
    keys: std::path::PathBuf,
) -> Result<i32, AttestError> {
    let options = AttestOptions {
        chunk_size: chunk,
        out_dir: out,
        keys_dir: keys,
    };
    let outcome = attest_file(file, &options, EnvSnapshot::capture())?;
    let claims = &outcome.attestation.claims;
    let summary = json!({
        "ok": true,
        "bundle": outcome.bundle_path.display().to_string(),
        "receipt": outcome.receipt_path.display().to_string(),
        "log": outcome.log_path.display().to_string(),
        "bytes": outcome.attestation.manifest.subject.byte_count,
        "leaf_count": claims.merkle.leaf_count,
        "merkle_root": claims.merkle.root,
    });
    println!("{summary}");
    Ok(0)
}

fn run_verify(bundle_path: &Path, file: &Path) -> Result<i32, AttestError> {
    require_file(file)?;
    let bundle = Attestation::load(bundle_path)?;
    let report = verify_bundle(&bundle, file)?;
    let doc = serde_json::to_string(&report)
        .map_err(|e| AttestError::MalformedBundle(e.to_string()))?;
    println!("{doc}");
    Ok(if report.ok { 0 } else { 3 })
}

fn run_log_verify(log_path: &Path) -> Result<i32, AttestError> {
    let report = TransparencyLog::open(log_path).verify()?;
    let doc = serde_json::to_string(&report)
        .map_err(|e| AttestError::MalformedBundle(e.to_string()))?;
    println!("{doc}");
    Ok(if report.ok { 0 } else { 3 })
}
