//! # resethiq Ledger
//!
//! The audit trail of the evidence kernel: per-step engine receipts and
//! the append-only transparency log.
//!
//! Every engine step emits a [`Receipt`] hashing its inputs, parameters,
//! and outputs; chains form by linking each receipt to its predecessor's
//! hash. Receipt hashes are then anchored in a hash-chained text log that
//! any holder can replay forward from `GENESIS`.

pub mod error;
pub mod log;
pub mod receipt;

pub use error::{LedgerError, Result};
pub use log::{LogVerification, TransparencyEntry, TransparencyLog, GENESIS};
pub use receipt::{Receipt, ReceiptBuilder, RECEIPT_VERSION};
