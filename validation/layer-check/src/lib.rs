//! Health check for registered map layers.
//!
//! Each layer identifier goes through four gated stages:
//! - fetch its rendering configuration from the registry (`fetcher`)
//! - validate the declared bounding box (`document`)
//! - render a preview image in-process (`preview`)
//! - reject blank previews (`classify`)
//!
//! `pipeline` runs the stages in order and reports one result line per
//! identifier. A failed stage fails every later stage without running it.

pub mod classify;
pub mod config;
pub mod document;
pub mod error;
pub mod fetcher;
pub mod outcome;
pub mod pipeline;
pub mod preview;
pub mod report;

pub use classify::{classify_image, histogram, ImageClassifier};
pub use config::{CheckConfig, FatalPolicy, OutputFormat};
pub use document::{validate_bbox, LayerDocument};
pub use error::{CheckError, CheckResult, RegistryError};
pub use fetcher::{ConfigFetcher, HttpRegistry, Registry, RegistryResponse};
pub use outcome::{Check, ValidationResult};
pub use pipeline::{CheckReport, RunSummary, ValidationPipeline};
pub use preview::PreviewRenderer;
pub use report::ResultsReport;

/// Whether `needle` occurs anywhere in `haystack`.
pub(crate) fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle)
}
