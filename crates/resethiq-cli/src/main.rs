//! resethiq - evidence-grade integrity attestations for data artifacts.
//!
//! Exit codes: 0 success (and `ok == true` for verification commands),
//! 1 usage or configuration error, 2 I/O or crypto error, 3 verification
//! mismatch.

use std::io::IsTerminal as _;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use resethiq_core::DEFAULT_CHUNK_SIZE;

mod commands;

/// Evidence-grade integrity attestations for data artifacts.
#[derive(Parser, Debug)]
#[command(name = "resethiq")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fingerprint a file: digests, leaf hashes, Merkle commitment
    Hash {
        /// The artifact to fingerprint
        file: PathBuf,

        /// Chunk size in bytes
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk: usize,
    },

    /// Produce a signed attestation bundle for a file
    Attest {
        /// The artifact to attest
        file: PathBuf,

        /// Chunk size in bytes
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk: usize,

        /// Output directory for the bundle, receipt, and log
        #[arg(long, default_value = "out")]
        out: PathBuf,

        /// Key store directory
        #[arg(long, default_value = "keys")]
        keys: PathBuf,
    },

    /// Verify a bundle against an artifact
    Verify {
        /// Path to attestation.json
        #[arg(long)]
        bundle: PathBuf,

        /// The artifact the bundle claims to cover
        #[arg(long)]
        file: PathBuf,
    },

    /// Transparency log operations
    Log {
        #[command(subcommand)]
        command: LogCommands,
    },
}

#[derive(Subcommand, Debug)]
enum LogCommands {
    /// Replay the chain from GENESIS and report integrity
    Verify {
        /// Path to the transparency log
        #[arg(long, default_value = "out/transparency.log")]
        log: PathBuf,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_tracing(&cli.log_level);
    std::process::exit(commands::run(cli.command));
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}
