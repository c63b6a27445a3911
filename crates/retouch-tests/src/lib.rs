//! Voice Retouch End-to-End Test Infrastructure
//!
//! This crate holds the integration tests for the retouch pipeline:
//!
//! - End-to-end: synthetic voices through the reference vocoder
//! - Failure scenarios: invalid parameters and collaborator failures
//! - Properties: invariants of the retouch operations checked with proptest
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p retouch-tests
//! ```
//!
//! The `signal` and `spectrum` modules provide test-signal generators and
//! measurements shared by the test files.

pub mod signal;
pub mod spectrum;

pub use signal::{harmonic_tone, peak_amplitude, rms, sine};
pub use spectrum::dominant_frequency;
