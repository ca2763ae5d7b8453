//! Error types for the rendering engines.

use std::path::PathBuf;

use thiserror::Error;
use wms_common::WmsError;

/// Errors raised while building or invoking a rendering engine.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid rendering configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read base configuration {}: {source}", path.display())]
    BaseConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Wms(#[from] WmsError),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Response body failed: {0}")]
    Body(String),
}
