//! Shared test utilities for the layer health-check workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Layer configuration document fixtures
//! - PNG generators for blank and non-blank previews
//! - An HTTP stub server standing in for the registry and upstream WMS
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;
pub mod server;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use server::{StubResponse, StubServer};

/// Temporary directory for a test's on-disk caches.
pub fn temp_cache_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("layer-check-")
        .tempdir()
        .expect("Failed to create temp dir")
}
