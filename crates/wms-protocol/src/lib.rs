//! OGC WMS protocol pieces needed to request and serve map previews.
//!
//! Supports:
//! - WMS 1.1.1 GetMap requests (KVP binding)
//! - WMS 1.1.1 service exception reports

pub mod exceptions;
pub mod getmap;

pub use exceptions::{service_exception_xml, SERVICE_EXCEPTION_MIME};
pub use getmap::{GetMapRequest, PREVIEW_FORMAT, PREVIEW_HEIGHT, PREVIEW_WIDTH};
