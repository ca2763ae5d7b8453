//! Error types for WMS request handling.

use thiserror::Error;

/// Result type alias using WmsError.
pub type WmsResult<T> = Result<T, WmsError>;

/// Primary error type for WMS operations.
#[derive(Debug, Error)]
pub enum WmsError {
    // === WMS Protocol Errors ===
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Operation not supported: {0}")]
    OperationNotSupported(String),

    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Invalid CRS: {0}")]
    InvalidCrs(String),

    #[error("Invalid BBOX: {0}")]
    InvalidBbox(String),

    // === Infrastructure Errors ===
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl WmsError {
    /// Get the OGC WMS exception code for this error.
    pub fn wms_exception_code(&self) -> &'static str {
        match self {
            WmsError::MissingParameter(_) => "MissingParameterValue",
            WmsError::InvalidParameter { .. } => "InvalidParameterValue",
            WmsError::OperationNotSupported(_) => "OperationNotSupported",
            WmsError::LayerNotFound(_) => "LayerNotDefined",
            WmsError::InvalidCrs(_) => "InvalidSRS",
            WmsError::InvalidBbox(_) => "InvalidBBox",
            WmsError::InternalError(_) => "NoApplicableCode",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            WmsError::MissingParameter(_)
            | WmsError::InvalidParameter { .. }
            | WmsError::OperationNotSupported(_)
            | WmsError::InvalidCrs(_)
            | WmsError::InvalidBbox(_) => 400,

            WmsError::LayerNotFound(_) => 404,

            WmsError::InternalError(_) => 500,
        }
    }
}

impl From<crate::BboxParseError> for WmsError {
    fn from(err: crate::BboxParseError) -> Self {
        WmsError::InvalidBbox(err.to_string())
    }
}

impl From<crate::CrsParseError> for WmsError {
    fn from(err: crate::CrsParseError) -> Self {
        WmsError::InvalidCrs(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_400() {
        let err = WmsError::MissingParameter("LAYERS".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.wms_exception_code(), "MissingParameterValue");
    }

    #[test]
    fn test_unknown_layer_maps_to_404() {
        let err = WmsError::LayerNotFound("roads".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.wms_exception_code(), "LayerNotDefined");
    }

    #[test]
    fn test_bbox_parse_error_converts() {
        let err: WmsError = crate::BboxParseError::InvalidFormat("1,2".to_string()).into();
        assert_eq!(err.wms_exception_code(), "InvalidBBox");
    }
}
