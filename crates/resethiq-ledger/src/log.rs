//! Append-only transparency log.
//!
//! One UTF-8 text file, one entry per line:
//!
//! ```text
//! timestamp \t receipt_hash \t prev_hash \t entry_hash
//! ```
//!
//! where `entry_hash = sha256_hex(prev_hash || "\n" || receipt_hash ||
//! "\n" || timestamp)` and `prev_hash` of the first line is `GENESIS`.
//! Appenders serialize on an exclusive lock over the log file; verifiers
//! replay the chain forward and recompute every entry hash.

use chrono::{SecondsFormat, Utc};
use fs2::FileExt;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use resethiq_core::Sha256Hash;

use crate::error::{LedgerError, Result};

/// Anchor value standing in for the entry hash before the first line.
pub const GENESIS: &str = "GENESIS";

/// One line of the transparency log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransparencyEntry {
    pub timestamp: String,
    pub receipt_hash: String,
    pub prev_hash: String,
    pub entry_hash: String,
}

impl TransparencyEntry {
    /// Compute the entry hash binding this line to its predecessor.
    pub fn compute_entry_hash(prev_hash: &str, receipt_hash: &str, timestamp: &str) -> String {
        let material = format!("{}\n{}\n{}", prev_hash, receipt_hash, timestamp);
        Sha256Hash::hash(material.as_bytes()).to_hex()
    }

    /// Render as a tab-separated line (no terminator).
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.timestamp, self.receipt_hash, self.prev_hash, self.entry_hash
        )
    }

    /// Parse one log line. `line_no` is 1-based, for error reporting.
    pub fn parse_line(line: &str, line_no: u64) -> Result<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 4 {
            return Err(LedgerError::MalformedEntry {
                line: line_no,
                reason: format!("expected 4 tab-separated fields, found {}", fields.len()),
            });
        }
        Ok(Self {
            timestamp: fields[0].to_string(),
            receipt_hash: fields[1].to_string(),
            prev_hash: fields[2].to_string(),
            entry_hash: fields[3].to_string(),
        })
    }
}

/// Result of replaying a log from `GENESIS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogVerification {
    pub ok: bool,
    pub entries: u64,
    /// 1-based line number of the first entry that breaks the chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_invalid_line: Option<u64>,
}

/// Handle on a transparency log file.
#[derive(Debug, Clone)]
pub struct TransparencyLog {
    path: PathBuf,
}

impl TransparencyLog {
    /// Open a handle. The file is created lazily on first append.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry for `receipt_hash`, timestamped now.
    pub fn append(&self, receipt_hash: &str) -> Result<TransparencyEntry> {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        self.append_with_timestamp(receipt_hash, &timestamp)
    }

    /// Append an entry with a caller-supplied timestamp.
    ///
    /// The read-last-line / append pair runs under an exclusive lock on
    /// the log file, so concurrent appenders serialize.
    pub fn append_with_timestamp(
        &self,
        receipt_hash: &str,
        timestamp: &str,
    ) -> Result<TransparencyEntry> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;
        file.lock_exclusive()?;

        let result = (|| {
            let prev_hash = match last_nonempty_line(&self.path)? {
                Some((line, line_no)) => TransparencyEntry::parse_line(&line, line_no)?.entry_hash,
                None => GENESIS.to_string(),
            };
            let entry = TransparencyEntry {
                timestamp: timestamp.to_string(),
                receipt_hash: receipt_hash.to_string(),
                entry_hash: TransparencyEntry::compute_entry_hash(
                    &prev_hash,
                    receipt_hash,
                    timestamp,
                ),
                prev_hash,
            };
            writeln!(file, "{}", entry.to_line())?;
            file.flush()?;
            tracing::debug!(entry_hash = %entry.entry_hash, "transparency log appended");
            Ok(entry)
        })();

        let _ = FileExt::unlock(&file);
        result
    }

    /// Read all entries without verifying the chain.
    pub fn entries(&self) -> Result<Vec<TransparencyEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = std::fs::read_to_string(&self.path)?;
        let mut out = Vec::new();
        for (i, line) in text.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            out.push(TransparencyEntry::parse_line(line, i as u64 + 1)?);
        }
        Ok(out)
    }

    /// Replay the chain forward from `GENESIS`, recomputing every entry
    /// hash. Any truncated, reordered, or edited line breaks the chain at
    /// that point.
    pub fn verify(&self) -> Result<LogVerification> {
        let entries = self.entries()?;
        let mut prev = GENESIS.to_string();
        for (i, entry) in entries.iter().enumerate() {
            let line_no = i as u64 + 1;
            let recomputed = TransparencyEntry::compute_entry_hash(
                &prev,
                &entry.receipt_hash,
                &entry.timestamp,
            );
            if entry.prev_hash != prev || entry.entry_hash != recomputed {
                tracing::warn!(line = line_no, "transparency log chain broken");
                return Ok(LogVerification {
                    ok: false,
                    entries: entries.len() as u64,
                    first_invalid_line: Some(line_no),
                });
            }
            prev = entry.entry_hash.clone();
        }
        Ok(LogVerification {
            ok: true,
            entries: entries.len() as u64,
            first_invalid_line: None,
        })
    }
}

fn last_nonempty_line(path: &Path) -> Result<Option<(String, u64)>> {
    let text = std::fs::read_to_string(path)?;
    let mut last = None;
    for (i, line) in text.lines().enumerate() {
        if !line.is_empty() {
            last = Some((line.to_string(), i as u64 + 1));
        }
    }
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_log(dir: &tempfile::TempDir) -> TransparencyLog {
        TransparencyLog::open(dir.path().join("transparency.log"))
    }

    #[test]
    fn test_first_entry_anchors_to_genesis() {
        let dir = tempdir().unwrap();
        let log = test_log(&dir);
        let entry = log
            .append_with_timestamp("deadbeef", "2026-01-14T12:00:00Z")
            .unwrap();
        assert_eq!(entry.prev_hash, GENESIS);
        assert_eq!(
            entry.entry_hash,
            "9252e38c7ab7ed39faaf1cab250b2facd7bc8b9ce0c8f7c5db3f7f9bbd8328c2"
        );
    }

    #[test]
    fn test_entries_chain() {
        let dir = tempdir().unwrap();
        let log = test_log(&dir);
        let first = log
            .append_with_timestamp("aaaa", "2026-01-14T12:00:00Z")
            .unwrap();
        let second = log
            .append_with_timestamp("bbbb", "2026-01-14T12:00:01Z")
            .unwrap();
        assert_eq!(second.prev_hash, first.entry_hash);

        let report = log.verify().unwrap();
        assert!(report.ok);
        assert_eq!(report.entries, 2);
    }

    #[test]
    fn test_verify_empty_log() {
        let dir = tempdir().unwrap();
        let log = test_log(&dir);
        let report = log.verify().unwrap();
        assert!(report.ok);
        assert_eq!(report.entries, 0);
    }

    #[test]
    fn test_edited_line_breaks_chain() {
        let dir = tempdir().unwrap();
        let log = test_log(&dir);
        for (hash, ts) in [
            ("aaaa", "2026-01-14T12:00:00Z"),
            ("bbbb", "2026-01-14T12:00:01Z"),
            ("cccc", "2026-01-14T12:00:02Z"),
        ] {
            log.append_with_timestamp(hash, ts).unwrap();
        }

        let text = std::fs::read_to_string(log.path()).unwrap();
        let tampered = text.replace("bbbb", "eeee");
        std::fs::write(log.path(), tampered).unwrap();

        let report = log.verify().unwrap();
        assert!(!report.ok);
        assert_eq!(report.first_invalid_line, Some(2));
    }

    #[test]
    fn test_removed_line_breaks_chain() {
        let dir = tempdir().unwrap();
        let log = test_log(&dir);
        for (hash, ts) in [
            ("aaaa", "2026-01-14T12:00:00Z"),
            ("bbbb", "2026-01-14T12:00:01Z"),
            ("cccc", "2026-01-14T12:00:02Z"),
        ] {
            log.append_with_timestamp(hash, ts).unwrap();
        }

        let text = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        std::fs::write(log.path(), format!("{}\n{}\n", lines[0], lines[2])).unwrap();

        let report = log.verify().unwrap();
        assert!(!report.ok);
        assert_eq!(report.first_invalid_line, Some(2));
    }

    #[test]
    fn test_malformed_line_reported_with_number() {
        let dir = tempdir().unwrap();
        let log = test_log(&dir);
        std::fs::write(log.path(), "only two\tfields\n").unwrap();
        let err = log.verify().unwrap_err();
        assert!(matches!(err, LedgerError::MalformedEntry { line: 1, .. }));
    }
}
