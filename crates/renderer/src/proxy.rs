//! Rendering engine that forwards GetMap requests to the layer's upstream WMS.
//!
//! The merged configuration follows the usual proxy layout:
//!
//! ```yaml
//! layers:
//!   - name: roads
//!     sources: [roads_cache]
//! caches:
//!   roads_cache:
//!     sources: [roads_wms]
//! sources:
//!   roads_wms:
//!     type: wms
//!     req:
//!       url: http://example.com/wms
//!       layers: osm:roads
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_yaml::Value;
use tracing::{debug, warn};
use wms_common::{WmsError, WmsResult};
use wms_protocol::{service_exception_xml, GetMapRequest, SERVICE_EXCEPTION_MIME};

use crate::{EngineFactory, RenderEngine, RenderError, RenderRequest, RenderResponse};

/// Path the WMS service is mounted at.
pub const SERVICE_PATH: &str = "/service";

/// Caches may point at other caches; give up after this many hops.
const MAX_SOURCE_DEPTH: usize = 8;

/// An upstream WMS a layer is rendered from.
#[derive(Debug, Clone, PartialEq)]
pub struct WmsSource {
    pub url: String,
    pub layers: String,
    pub transparent: Option<bool>,
}

/// Forwards preview requests to the upstream WMS named by the configuration.
pub struct ProxyEngine {
    config: Value,
    client: Client,
    timeout: Option<Duration>,
}

impl ProxyEngine {
    pub fn new(config: Value, client: Client) -> Result<Self, RenderError> {
        if !config.is_mapping() {
            return Err(RenderError::InvalidConfig(
                "configuration must be a mapping".to_string(),
            ));
        }

        let timeout = config
            .get("globals")
            .and_then(|g| g.get("http"))
            .and_then(|h| h.get("client_timeout"))
            .and_then(Value::as_f64)
            .filter(|secs| *secs > 0.0)
            .map(Duration::from_secs_f64);

        Ok(Self {
            config,
            client,
            timeout,
        })
    }

    /// Follow a layer's first source through any caches to its WMS source.
    ///
    /// Returns `Ok(None)` when the layer is not defined.
    pub fn resolve_source(&self, layer: &str) -> Result<Option<WmsSource>, RenderError> {
        let found = self
            .config
            .get("layers")
            .and_then(Value::as_sequence)
            .and_then(|layers| {
                layers
                    .iter()
                    .find(|l| l.get("name").and_then(Value::as_str) == Some(layer))
            });
        let Some(found) = found else {
            return Ok(None);
        };

        let mut name = first_source(found).ok_or_else(|| {
            RenderError::InvalidConfig(format!("layer '{}' has no sources", layer))
        })?;

        for _ in 0..MAX_SOURCE_DEPTH {
            if let Some(cache) = self.config.get("caches").and_then(|c| c.get(name)) {
                name = first_source(cache).ok_or_else(|| {
                    RenderError::InvalidConfig(format!("cache '{}' has no sources", name))
                })?;
                continue;
            }

            let source = self
                .config
                .get("sources")
                .and_then(|s| s.get(name))
                .ok_or_else(|| RenderError::InvalidConfig(format!("unknown source '{}'", name)))?;
            return parse_wms_source(name, source).map(Some);
        }

        Err(RenderError::InvalidConfig(format!(
            "source chain for layer '{}' is deeper than {}",
            layer, MAX_SOURCE_DEPTH
        )))
    }
}

#[async_trait]
impl RenderEngine for ProxyEngine {
    async fn handle(
        &self,
        request: &RenderRequest,
    ) -> Result<Option<RenderResponse>, RenderError> {
        if request.method != "GET" || request.path != SERVICE_PATH {
            debug!(method = %request.method, path = %request.path, "No route for request");
            return Ok(None);
        }

        let get_map = match parse_get_map(&request.query) {
            Ok(get_map) => get_map,
            Err(err) => {
                warn!(error = %err, "Rejected GetMap request");
                return Ok(Some(exception_response(&err)));
            }
        };

        let Some(source) = self.resolve_source(&get_map.layers)? else {
            let err = WmsError::LayerNotFound(get_map.layers.clone());
            warn!(layer = %get_map.layers, "GetMap for undefined layer");
            return Ok(Some(exception_response(&err)));
        };

        let url = upstream_url(&source, &get_map)?;
        debug!(url = %url, layer = %get_map.layers, "Forwarding GetMap upstream");

        let mut upstream = self.client.get(url);
        if let Some(timeout) = self.timeout {
            upstream = upstream.timeout(timeout);
        }
        let response = upstream.send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?;

        debug!(status = status, bytes = body.len(), "Upstream responded");
        Ok(Some(RenderResponse::single_chunk(status, headers, body)))
    }
}

/// Builds a `ProxyEngine` per configuration, sharing one HTTP client.
#[derive(Clone)]
pub struct ProxyEngineFactory {
    client: Client,
}

impl ProxyEngineFactory {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl EngineFactory for ProxyEngineFactory {
    fn build(&self, config: Value) -> Result<Box<dyn RenderEngine>, RenderError> {
        Ok(Box::new(ProxyEngine::new(config, self.client.clone())?))
    }
}

fn parse_get_map(query: &str) -> WmsResult<GetMapRequest> {
    let request = GetMapRequest::from_query_string(query)?;
    request.crs()?;
    request.bounding_box()?;
    Ok(request)
}

fn first_source(node: &Value) -> Option<&str> {
    node.get("sources")
        .and_then(Value::as_sequence)
        .and_then(|sources| sources.first())
        .and_then(Value::as_str)
}

fn parse_wms_source(name: &str, source: &Value) -> Result<WmsSource, RenderError> {
    let kind = source.get("type").and_then(Value::as_str).unwrap_or_default();
    if kind != "wms" {
        return Err(RenderError::InvalidConfig(format!(
            "source '{}' has unsupported type '{}'",
            name, kind
        )));
    }

    let req = source
        .get("req")
        .ok_or_else(|| RenderError::InvalidConfig(format!("source '{}' has no req", name)))?;
    let field = |key: &str| {
        req.get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                RenderError::InvalidConfig(format!("source '{}' is missing req.{}", name, key))
            })
    };

    Ok(WmsSource {
        url: field("url")?,
        layers: field("layers")?,
        transparent: req.get("transparent").and_then(Value::as_bool),
    })
}

fn upstream_url(source: &WmsSource, request: &GetMapRequest) -> Result<Url, RenderError> {
    let mut url = Url::parse(&source.url).map_err(|e| {
        RenderError::InvalidConfig(format!("invalid source url '{}': {}", source.url, e))
    })?;
    let transparent = source.transparent.unwrap_or_else(|| request.is_transparent());

    url.query_pairs_mut()
        .append_pair("SERVICE", "WMS")
        .append_pair("REQUEST", "GetMap")
        .append_pair("VERSION", "1.1.1")
        .append_pair("LAYERS", &source.layers)
        .append_pair("STYLES", "")
        .append_pair("SRS", &request.srs)
        .append_pair("BBOX", &request.bbox)
        .append_pair("WIDTH", &request.width.to_string())
        .append_pair("HEIGHT", &request.height.to_string())
        .append_pair("FORMAT", &request.format)
        .append_pair("TRANSPARENT", if transparent { "TRUE" } else { "FALSE" });

    Ok(url)
}

fn exception_response(err: &WmsError) -> RenderResponse {
    RenderResponse::single_chunk(
        err.http_status_code(),
        vec![(
            "content-type".to_string(),
            SERVICE_EXCEPTION_MIME.to_string(),
        )],
        service_exception_xml(err),
    )
}
