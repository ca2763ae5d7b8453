//! Error types for the layer health check.
//!
//! Recoverable conditions never show up here; they become `Check::Invalid`
//! flags. A `CheckError` stops the current identifier.

use std::path::PathBuf;

use thiserror::Error;
use wms_common::LayerIdError;

/// Fatal errors for one identifier.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Invalid layer identifier: {0}")]
    InvalidIdentifier(#[from] LayerIdError),

    #[error("Configuration for layer {id} is not a YAML mapping: {source}")]
    NotADocument {
        id: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Configuration for layer {id} has a non-numeric bbox coordinate {token:?}")]
    InvalidCoordinate { id: String, token: String },

    #[error("Configuration for layer {id} has no layers[0].name")]
    MissingLayerName { id: String },

    #[error("Preview for layer {id} could not be decoded: {source}")]
    ImageDecode {
        id: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to serialize result: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CheckError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CheckError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type CheckResult<T> = Result<T, CheckError>;

/// Failure to get any HTTP response out of the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Registry request timed out: {0}")]
    Timeout(String),

    #[error("Registry request failed: {0}")]
    Transport(String),

    #[error("Registry URL cannot hold a layer path: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RegistryError::Timeout(err.to_string())
        } else {
            RegistryError::Transport(err.to_string())
        }
    }
}
