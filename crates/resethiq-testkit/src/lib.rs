//! # resethiq Testkit
//!
//! Testing utilities for the resethiq evidence kernel.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known inputs with expected digests and roots,
//!   pinning the wire contract across implementations
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Scratch workspaces with a fixed environment snapshot
//!   for byte-reproducible attestation tests
//!
//! ## Golden Vectors
//!
//! ```rust
//! use resethiq_testkit::vectors::{all_vectors, verify_vector};
//!
//! for vector in all_vectors() {
//!     assert!(verify_vector(&vector), "{} diverged", vector.name);
//! }
//! ```
//!
//! ## Fixtures
//!
//! ```rust
//! use resethiq_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let artifact = fixture.write_artifact("data.bin", b"hello world");
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::TestFixture;
pub use vectors::{all_vectors, verify_vector, GoldenVector};
