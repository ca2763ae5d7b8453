//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

/// The full geographic extent as a WMS BBOX string.
pub const WORLD_BBOX: &str = "-180,-90,180,90";

/// A geographic or projected bounding box.
///
/// For geographic CRS (EPSG:4326), coordinates are in degrees.
/// For projected CRS (EPSG:3857), coordinates are in meters.
///
/// Corners are kept in the order they were declared; `min_x < max_x` is not
/// enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// The valid geographic extent, `[-180, -90, 180, 90]`.
    pub const WORLD: BoundingBox = BoundingBox {
        min_x: -180.0,
        min_y: -90.0,
        max_x: 180.0,
        max_y: 90.0,
    };

    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Parse a WMS BBOX parameter string: "minx,miny,maxx,maxy"
    ///
    /// Whitespace around each coordinate is ignored.
    pub fn from_wms_string(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let coord = |part: &str| {
            part.parse::<f64>()
                .map_err(|_| BboxParseError::InvalidNumber(part.to_string()))
        };

        Ok(Self {
            min_x: coord(parts[0])?,
            min_y: coord(parts[1])?,
            max_x: coord(parts[2])?,
            max_y: coord(parts[3])?,
        })
    }

    /// Check that each side lies inside the matching side of `extent`.
    ///
    /// Only the four one-sided comparisons are made: `min_x >= extent.min_x`,
    /// `min_y >= extent.min_y`, `max_x <= extent.max_x`, `max_y <= extent.max_y`.
    /// A NaN coordinate fails every comparison.
    pub fn is_within(&self, extent: &BoundingBox) -> bool {
        self.min_x >= extent.min_x
            && self.min_y >= extent.min_y
            && self.max_x <= extent.max_x
            && self.max_y <= extent.max_y
    }

    /// Check against the valid geographic extent.
    pub fn is_within_world(&self) -> bool {
        self.is_within(&Self::WORLD)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid BBOX format: {0}. Expected 'minx,miny,maxx,maxy'")]
    InvalidFormat(String),

    #[error("Invalid number in BBOX: {0}")]
    InvalidNumber(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wms_bbox() {
        let bbox = BoundingBox::from_wms_string("-125.0,24.0,-66.0,50.0").unwrap();
        assert_eq!(bbox.min_x, -125.0);
        assert_eq!(bbox.min_y, 24.0);
        assert_eq!(bbox.max_x, -66.0);
        assert_eq!(bbox.max_y, 50.0);
    }

    #[test]
    fn test_world_string_matches_constant() {
        let bbox = BoundingBox::from_wms_string(WORLD_BBOX).unwrap();
        assert_eq!(bbox, BoundingBox::WORLD);
        assert!(bbox.is_within_world());
    }

    #[test]
    fn test_nan_is_not_within() {
        let bbox = BoundingBox::new(f64::NAN, 0.0, 10.0, 10.0);
        assert!(!bbox.is_within_world());
    }
}
