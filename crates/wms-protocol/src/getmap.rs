//! WMS GetMap request descriptor.
//!
//! A `GetMapRequest` is both what the health check synthesizes for a preview
//! and what a rendering engine parses back out of the query string.

use serde::{Deserialize, Serialize};
use wms_common::{BoundingBox, CrsCode, WmsError, WmsResult};

/// Preview image width in pixels.
pub const PREVIEW_WIDTH: u32 = 200;
/// Preview image height in pixels.
pub const PREVIEW_HEIGHT: u32 = 150;
/// Preview image format.
pub const PREVIEW_FORMAT: &str = "image/png";

/// GetMap request parameters (WMS 1.1.1).
///
/// Field order is the order parameters appear in the encoded query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetMapRequest {
    #[serde(rename = "SERVICE")]
    pub service: String,
    #[serde(rename = "REQUEST")]
    pub request: String,
    #[serde(rename = "VERSION")]
    pub version: String,
    #[serde(rename = "LAYERS")]
    pub layers: String,
    #[serde(rename = "STYLES")]
    pub styles: String,
    #[serde(rename = "SRS")]
    pub srs: String,
    /// Raw BBOX value, passed through exactly as declared by the layer
    #[serde(rename = "BBOX")]
    pub bbox: String,
    #[serde(rename = "WIDTH")]
    pub width: u32,
    #[serde(rename = "HEIGHT")]
    pub height: u32,
    #[serde(rename = "FORMAT")]
    pub format: String,
    #[serde(rename = "TRANSPARENT")]
    pub transparent: String,
}

/// Query parameters as received; everything optional so missing values can be
/// reported by name.
#[derive(Debug, Deserialize)]
struct GetMapParams {
    #[serde(rename = "SERVICE", alias = "service")]
    service: Option<String>,
    #[serde(rename = "REQUEST", alias = "request")]
    request: Option<String>,
    #[serde(rename = "VERSION", alias = "version")]
    version: Option<String>,
    #[serde(rename = "LAYERS", alias = "layers")]
    layers: Option<String>,
    #[serde(rename = "STYLES", alias = "styles")]
    styles: Option<String>,
    #[serde(rename = "SRS", alias = "CRS", alias = "srs", alias = "crs")]
    srs: Option<String>,
    #[serde(rename = "BBOX", alias = "bbox")]
    bbox: Option<String>,
    #[serde(rename = "WIDTH", alias = "width")]
    width: Option<u32>,
    #[serde(rename = "HEIGHT", alias = "height")]
    height: Option<u32>,
    #[serde(rename = "FORMAT", alias = "format")]
    format: Option<String>,
    #[serde(rename = "TRANSPARENT", alias = "transparent")]
    transparent: Option<String>,
}

impl GetMapRequest {
    /// The fixed-shape preview request for a layer: PNG, EPSG:4326,
    /// transparent, 200x150.
    pub fn preview(layer: &str, bbox: &str) -> Self {
        Self {
            service: "WMS".to_string(),
            request: "GetMap".to_string(),
            version: "1.1.1".to_string(),
            layers: layer.to_string(),
            styles: String::new(),
            srs: CrsCode::Epsg4326.to_string(),
            bbox: bbox.to_string(),
            width: PREVIEW_WIDTH,
            height: PREVIEW_HEIGHT,
            format: PREVIEW_FORMAT.to_string(),
            transparent: "TRUE".to_string(),
        }
    }

    /// Encode as a URL query string (without the leading `?`).
    pub fn to_query_string(&self) -> WmsResult<String> {
        serde_urlencoded::to_string(self).map_err(|e| WmsError::InternalError(e.to_string()))
    }

    /// Parse a GetMap request from a URL query string.
    pub fn from_query_string(query: &str) -> WmsResult<Self> {
        let params: GetMapParams =
            serde_urlencoded::from_str(query).map_err(|e| WmsError::InvalidParameter {
                param: "query".to_string(),
                message: e.to_string(),
            })?;

        let service = params.service.unwrap_or_else(|| "WMS".to_string());
        if !service.eq_ignore_ascii_case("WMS") {
            return Err(WmsError::InvalidParameter {
                param: "SERVICE".to_string(),
                message: "SERVICE must be WMS".to_string(),
            });
        }

        let request = params
            .request
            .ok_or_else(|| WmsError::MissingParameter("REQUEST".to_string()))?;
        if !request.eq_ignore_ascii_case("GetMap") {
            return Err(WmsError::OperationNotSupported(request));
        }

        let require = |value: Option<String>, name: &str| {
            value.ok_or_else(|| WmsError::MissingParameter(name.to_string()))
        };

        Ok(Self {
            service,
            request,
            version: params.version.unwrap_or_else(|| "1.1.1".to_string()),
            layers: require(params.layers, "LAYERS")?,
            styles: params.styles.unwrap_or_default(),
            srs: require(params.srs, "SRS")?,
            bbox: require(params.bbox, "BBOX")?,
            width: params
                .width
                .ok_or_else(|| WmsError::MissingParameter("WIDTH".to_string()))?,
            height: params
                .height
                .ok_or_else(|| WmsError::MissingParameter("HEIGHT".to_string()))?,
            format: params.format.unwrap_or_else(|| PREVIEW_FORMAT.to_string()),
            transparent: params.transparent.unwrap_or_else(|| "FALSE".to_string()),
        })
    }

    /// Parsed CRS of the request.
    pub fn crs(&self) -> WmsResult<CrsCode> {
        Ok(CrsCode::from_wms_string(&self.srs)?)
    }

    /// Parsed BBOX of the request.
    pub fn bounding_box(&self) -> WmsResult<BoundingBox> {
        Ok(BoundingBox::from_wms_string(&self.bbox)?)
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent.eq_ignore_ascii_case("true")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_has_fixed_shape() {
        let req = GetMapRequest::preview("roads", "-10,-5,10,5");
        assert_eq!(req.width, 200);
        assert_eq!(req.height, 150);
        assert_eq!(req.format, "image/png");
        assert_eq!(req.srs, "EPSG:4326");
        assert!(req.is_transparent());
        assert_eq!(req.layers, "roads");
        assert_eq!(req.bbox, "-10,-5,10,5");
    }

    #[test]
    fn test_preview_query_string() {
        let query = GetMapRequest::preview("roads", "-180,-90,180,90")
            .to_query_string()
            .unwrap();
        assert_eq!(
            query,
            "SERVICE=WMS&REQUEST=GetMap&VERSION=1.1.1&LAYERS=roads&STYLES=&SRS=EPSG%3A4326\
             &BBOX=-180%2C-90%2C180%2C90&WIDTH=200&HEIGHT=150&FORMAT=image%2Fpng&TRANSPARENT=TRUE"
        );
    }

    #[test]
    fn test_parse_lowercase_and_crs_alias() {
        let req = GetMapRequest::from_query_string(
            "service=wms&request=getmap&layers=a&crs=EPSG:3857&bbox=0,0,1,1&width=10&height=20",
        )
        .unwrap();
        assert_eq!(req.layers, "a");
        assert_eq!(req.crs().unwrap(), CrsCode::Epsg3857);
        assert_eq!(req.width, 10);
        assert_eq!(req.height, 20);
        assert!(!req.is_transparent());
    }

    #[test]
    fn test_parse_missing_layers() {
        let err = GetMapRequest::from_query_string(
            "SERVICE=WMS&REQUEST=GetMap&SRS=EPSG:4326&BBOX=0,0,1,1&WIDTH=1&HEIGHT=1",
        )
        .unwrap_err();
        assert!(matches!(err, WmsError::MissingParameter(ref p) if p == "LAYERS"));
    }

    #[test]
    fn test_parse_other_operation_is_not_supported() {
        let err =
            GetMapRequest::from_query_string("SERVICE=WMS&REQUEST=GetCapabilities").unwrap_err();
        assert!(matches!(err, WmsError::OperationNotSupported(_)));
    }

    #[test]
    fn test_parse_bad_width() {
        let err = GetMapRequest::from_query_string("REQUEST=GetMap&WIDTH=wide").unwrap_err();
        assert_eq!(err.wms_exception_code(), "InvalidParameterValue");
    }
}
