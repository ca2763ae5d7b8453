//! Reading a cached layer configuration and validating its bounding box.

use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};
use wms_common::bbox::{BboxParseError, BoundingBox, WORLD_BBOX};
use wms_common::LayerId;

use crate::{Check, CheckError, CheckResult};

/// A parsed layer configuration document.
#[derive(Debug, Clone)]
pub struct LayerDocument {
    id: String,
    root: Value,
}

impl LayerDocument {
    /// Parse `bytes` as the configuration of layer `id`. The top level must be
    /// a mapping.
    pub fn parse(id: &LayerId, bytes: &[u8]) -> CheckResult<Self> {
        let mapping: Mapping =
            serde_yaml::from_slice(bytes).map_err(|source| CheckError::NotADocument {
                id: id.to_string(),
                source,
            })?;
        Ok(Self {
            id: id.to_string(),
            root: Value::Mapping(mapping),
        })
    }

    pub async fn load(id: &LayerId, path: &Path) -> CheckResult<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| CheckError::io(path, e))?;
        Self::parse(id, &bytes)
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// `services.wms.bbox` as declared. A null section counts as absent.
    pub fn declared_bbox(&self) -> Option<&Value> {
        self.root
            .get("services")
            .and_then(|s| s.get("wms"))
            .and_then(|w| w.get("bbox"))
            .filter(|b| !b.is_null())
    }

    /// The bbox to render the preview with: the declared one, or the whole world.
    pub fn preview_bbox(&self) -> &str {
        self.declared_bbox()
            .and_then(Value::as_str)
            .unwrap_or(WORLD_BBOX)
    }

    /// `layers[0].name`, the layer the preview is rendered for.
    pub fn primary_layer_name(&self) -> CheckResult<String> {
        let name = self
            .root
            .get("layers")
            .and_then(Value::as_sequence)
            .and_then(|layers| layers.first())
            .and_then(|layer| layer.get("name"));

        match name {
            Some(Value::String(name)) => Ok(name.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(CheckError::MissingLayerName {
                id: self.id.clone(),
            }),
        }
    }
}

/// Check the declared bbox against the world extent.
///
/// A missing `services`, `wms` or `bbox` key, a bbox that is not a string, a
/// token count other than four and any side outside the extent are all
/// `Check::Invalid`. A token that is not a number is fatal.
pub fn validate_bbox(document: &LayerDocument) -> CheckResult<Check> {
    let Some(declared) = document.declared_bbox() else {
        warn!(layer_id = %document.id, "Configuration declares no services.wms.bbox");
        return Ok(Check::Invalid);
    };
    let Some(declared) = declared.as_str() else {
        warn!(layer_id = %document.id, "Declared bbox is not a string");
        return Ok(Check::Invalid);
    };

    let bbox = match BoundingBox::from_wms_string(declared) {
        Ok(bbox) => bbox,
        Err(BboxParseError::InvalidFormat(_)) => {
            warn!(layer_id = %document.id, bbox = %declared, "Declared bbox does not have four coordinates");
            return Ok(Check::Invalid);
        }
        Err(BboxParseError::InvalidNumber(token)) => {
            return Err(CheckError::InvalidCoordinate {
                id: document.id.clone(),
                token,
            });
        }
    };

    if !bbox.is_within_world() {
        warn!(layer_id = %document.id, bbox = %declared, "Declared bbox is outside the world extent");
        return Ok(Check::Invalid);
    }

    debug!(layer_id = %document.id, bbox = %declared, "Declared bbox is valid");
    Ok(Check::Valid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(yaml: &str) -> LayerDocument {
        LayerDocument::parse(&LayerId::parse("t").unwrap(), yaml.as_bytes()).unwrap()
    }

    #[test]
    fn test_valid_bbox() {
        let d = doc("services:\n  wms:\n    bbox: '-10,-5,10,5'\n");
        assert_eq!(validate_bbox(&d).unwrap(), Check::Valid);
    }

    #[test]
    fn test_boundary_bbox_is_valid() {
        let d = doc("services: {wms: {bbox: '-180,-90,180,90'}}");
        assert_eq!(validate_bbox(&d).unwrap(), Check::Valid);
    }

    #[test]
    fn test_missing_keys_are_invalid() {
        for yaml in [
            "layers: []",
            "services: ~",
            "services: {}",
            "services: {wms: {}}",
            "services: {wms: {srs: ['EPSG:4326']}}",
            "services: {wms: {bbox: ~}}",
        ] {
            assert_eq!(validate_bbox(&doc(yaml)).unwrap(), Check::Invalid, "{}", yaml);
        }
    }

    #[test]
    fn test_wrong_token_count_is_invalid() {
        for bbox in ["1,2,3", "1,2,3,4,5", ""] {
            let d = doc(&format!("services: {{wms: {{bbox: '{}'}}}}", bbox));
            assert_eq!(validate_bbox(&d).unwrap(), Check::Invalid, "{}", bbox);
        }
    }

    #[test]
    fn test_non_string_bbox_is_invalid() {
        let d = doc("services: {wms: {bbox: [-10, -5, 10, 5]}}");
        assert_eq!(validate_bbox(&d).unwrap(), Check::Invalid);
    }

    #[test]
    fn test_out_of_range_is_invalid() {
        let d = doc("services: {wms: {bbox: '-200,-90,180,90'}}");
        assert_eq!(validate_bbox(&d).unwrap(), Check::Invalid);
    }

    #[test]
    fn test_non_numeric_token_is_fatal() {
        let d = doc("services: {wms: {bbox: '-10,south,10,10'}}");
        let err = validate_bbox(&d).unwrap_err();
        assert!(matches!(err, CheckError::InvalidCoordinate { ref token, .. } if token == "south"));
    }

    #[test]
    fn test_preview_bbox_defaults_to_world() {
        assert_eq!(doc("layers: []").preview_bbox(), "-180,-90,180,90");
        assert_eq!(
            doc("services: {wms: {bbox: '1,2,3,4'}}").preview_bbox(),
            "1,2,3,4"
        );
    }

    #[test]
    fn test_primary_layer_name() {
        let d = doc("layers:\n  - name: roads\n  - name: rivers\n");
        assert_eq!(d.primary_layer_name().unwrap(), "roads");
    }

    #[test]
    fn test_missing_layer_name_is_fatal() {
        for yaml in ["services: {}", "layers: []", "layers: [{title: x}]"] {
            let err = doc(yaml).primary_layer_name().unwrap_err();
            assert!(matches!(err, CheckError::MissingLayerName { .. }), "{}", yaml);
        }
    }

    #[test]
    fn test_non_mapping_is_not_a_document() {
        let id = LayerId::parse("t").unwrap();
        assert!(matches!(
            LayerDocument::parse(&id, b"- a\n- b\n"),
            Err(CheckError::NotADocument { .. })
        ));
    }
}
