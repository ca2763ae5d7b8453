//! Common test fixtures for layer health-check tests.
//!
//! Layer documents follow the layout the registry serves: a `services.wms`
//! section declaring the bbox, a `layers` list and the `caches`/`sources`
//! chain the rendering engine follows.

/// Common BBOX strings for testing.
pub mod bbox {
    /// Global extent, exactly on the boundary
    pub const GLOBAL: &str = "-180,-90,180,90";

    /// Continental United States
    pub const CONUS: &str = "-130,20,-60,55";

    /// Europe
    pub const EUROPE: &str = "-15,35,45,72";

    /// Western edge beyond -180
    pub const OUT_OF_RANGE: &str = "-200,-90,180,90";

    /// Only three coordinates
    pub const THREE_TOKENS: &str = "-10,-10,10";

    /// Four tokens, one of them not a number
    pub const NON_NUMERIC: &str = "-10,south,10,10";
}

/// Registry error page; links the error stylesheet the registry template uses.
pub const REGISTRY_ERROR_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Registry</title>
  <link rel="stylesheet" href="/static/css/error-page.css">
</head>
<body><h1>Something went wrong</h1></body>
</html>
"#;

/// A layer document whose only layer renders from a WMS at `upstream_url`.
///
/// `bbox` of `None` omits the `services` section entirely.
pub fn layer_document(layer_name: &str, bbox: Option<&str>, upstream_url: &str) -> String {
    let services = match bbox {
        Some(bbox) => format!("services:\n  wms:\n    bbox: \"{}\"\n", bbox),
        None => String::new(),
    };

    format!(
        r#"{services}layers:
  - name: {layer}
    title: {layer}
    sources: [{layer}_cache]
caches:
  {layer}_cache:
    grids: [GLOBAL_GEODETIC]
    sources: [{layer}_wms]
sources:
  {layer}_wms:
    type: wms
    req:
      url: {upstream}
      layers: {layer}
"#,
        services = services,
        layer = layer_name,
        upstream = upstream_url,
    )
}

/// A layer document with `services.wms` present but no `bbox`.
pub fn layer_document_without_bbox(layer_name: &str, upstream_url: &str) -> String {
    let doc = layer_document(layer_name, None, upstream_url);
    format!("services:\n  wms:\n    srs: ['EPSG:4326']\n{}", doc)
}
