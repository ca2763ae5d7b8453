//! WMS 1.1.1 service exception reports.

use quick_xml::escape::escape;
use wms_common::WmsError;

/// MIME type of a WMS 1.1.1 exception report.
pub const SERVICE_EXCEPTION_MIME: &str = "application/vnd.ogc.se_xml";

/// Build a `ServiceExceptionReport` document for an error.
pub fn service_exception_xml(err: &WmsError) -> String {
    format!(
        r#"<?xml version="1.0"?>
<ServiceExceptionReport version="1.1.1">
    <ServiceException code="{}">{}</ServiceException>
</ServiceExceptionReport>
"#,
        err.wms_exception_code(),
        escape(err.to_string().as_str())
    )
}
