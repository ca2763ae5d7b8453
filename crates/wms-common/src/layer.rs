//! Layer registration identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a layer registration.
///
/// Opaque to this crate apart from being usable as a file stem: every cached
/// artifact for a layer is stored as `<id>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(String);

impl LayerId {
    /// Parse an identifier, rejecting values that cannot be used as a file stem.
    pub fn parse(s: &str) -> Result<Self, LayerIdError> {
        if s.is_empty() {
            return Err(LayerIdError::Empty);
        }
        if s == "." || s == ".." || s.contains(['/', '\\', '\0']) {
            return Err(LayerIdError::NotAFileStem(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name for an artifact of this layer, e.g. `abc.yml`.
    pub fn file_name(&self, ext: &str) -> String {
        format!("{}.{}", self.0, ext)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayerIdError {
    #[error("Layer identifier is empty")]
    Empty,

    #[error("Layer identifier cannot be used as a file name: {0:?}")]
    NotAFileStem(String),

    #[error("Layer identifier is not valid UTF-8: {0:?}")]
    NotUtf8(String),
}
