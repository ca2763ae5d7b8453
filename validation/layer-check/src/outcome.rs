//! Per-stage outcomes and the per-identifier result tuple.
//!
//! Output polarity is inverted: `0` means the stage passed, `1` means it
//! failed. `Check` keeps that convention out of the pipeline logic and only
//! turns into a number when written out.

use std::fmt;

use serde::{Serialize, Serializer};

/// Outcome of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Check {
    Valid,
    #[default]
    Invalid,
}

impl Check {
    /// Output flag: 0 = valid, 1 = invalid.
    pub fn flag(self) -> u8 {
        match self {
            Check::Valid => 0,
            Check::Invalid => 1,
        }
    }

    pub fn is_valid(self) -> bool {
        self == Check::Valid
    }
}

impl From<bool> for Check {
    fn from(valid: bool) -> Self {
        if valid {
            Check::Valid
        } else {
            Check::Invalid
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.flag())
    }
}

impl Serialize for Check {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.flag())
    }
}

/// The four stage outcomes for one identifier.
///
/// Stages that were never attempted stay `Invalid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub id: String,
    #[serde(rename = "valid_bbox")]
    pub bbox: Check,
    #[serde(rename = "valid_config")]
    pub config: Check,
    #[serde(rename = "valid_image")]
    pub image: Check,
    #[serde(rename = "valid_color")]
    pub color: Check,
}

impl ValidationResult {
    /// A result with every stage failed.
    pub fn failed(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            bbox: Check::Invalid,
            config: Check::Invalid,
            image: Check::Invalid,
            color: Check::Invalid,
        }
    }

    /// Every stage passed.
    pub fn is_healthy(&self) -> bool {
        self.config.is_valid()
            && self.bbox.is_valid()
            && self.image.is_valid()
            && self.color.is_valid()
    }
}

impl fmt::Display for ValidationResult {
    /// `id validBbox validConfig validImage validColor`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.id, self.bbox, self.config, self.image, self.color
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_are_inverted() {
        assert_eq!(Check::Valid.flag(), 0);
        assert_eq!(Check::Invalid.flag(), 1);
        assert_eq!(Check::from(true), Check::Valid);
    }

    #[test]
    fn test_display_field_order() {
        let result = ValidationResult {
            id: "def".to_string(),
            bbox: Check::Invalid,
            config: Check::Valid,
            image: Check::Invalid,
            color: Check::Invalid,
        };
        assert_eq!(result.to_string(), "def 1 0 1 1");
        assert!(!result.is_healthy());
    }

    #[test]
    fn test_json_uses_numeric_flags() {
        let mut result = ValidationResult::failed("abc");
        result.config = Check::Valid;
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(
            json,
            r#"{"id":"abc","valid_bbox":1,"valid_config":0,"valid_image":1,"valid_color":1}"#
        );
    }
}
