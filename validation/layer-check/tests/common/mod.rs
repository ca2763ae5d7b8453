//! Shared fakes for layer-check integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use layer_check::{
    CheckConfig, FatalPolicy, OutputFormat, Registry, RegistryError, RegistryResponse, RunSummary,
    ValidationPipeline,
};
use renderer::{EngineFactory, RenderEngine, RenderError, RenderRequest, RenderResponse};
use serde_yaml::Value;
use tempfile::TempDir;
use wms_protocol::GetMapRequest;

pub const REGISTRY_URL: &str = "http://registry.test";

// ============================================================================
// Registry
// ============================================================================

/// In-memory registry keyed by layer identifier. Unknown identifiers get 404.
#[derive(Default)]
pub struct FakeRegistry {
    responses: Mutex<HashMap<String, RegistryResponse>>,
    calls: AtomicUsize,
}

impl FakeRegistry {
    pub fn serve(&self, id: &str, status: u16, body: impl Into<Bytes>) {
        self.responses.lock().unwrap().insert(
            format!("{}/{}/map/config", REGISTRY_URL, id),
            RegistryResponse {
                status,
                body: body.into(),
            },
        );
    }

    /// Serve a layer document for `id` whose layer is also called `id`.
    pub fn serve_layer(&self, id: &str, bbox: Option<&str>) {
        self.serve(
            id,
            200,
            test_utils::layer_document(id, bbox, "http://upstream.test/wms"),
        );
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Registry for FakeRegistry {
    async fn get(&self, url: &str) -> Result<RegistryResponse, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or(RegistryResponse {
                status: 404,
                body: Bytes::from_static(b"not found"),
            }))
    }
}

// ============================================================================
// Rendering engine
// ============================================================================

/// What the fake engine does for a given layer.
#[derive(Debug, Clone)]
pub enum EngineBehavior {
    Image(Vec<u8>),
    Fail,
    NoResponse,
    Status(u16),
    EmptyBody,
    Hang,
}

#[derive(Default)]
pub struct EngineState {
    behaviors: Mutex<HashMap<String, EngineBehavior>>,
    builds: AtomicUsize,
    calls: AtomicUsize,
    requests: Mutex<Vec<RenderRequest>>,
    configs: Mutex<Vec<Value>>,
}

/// Engine factory whose engines answer per requested layer.
/// Layers without a behavior get a 404 with an exception body.
#[derive(Default, Clone)]
pub struct FakeEngineFactory {
    state: Arc<EngineState>,
}

impl FakeEngineFactory {
    pub fn on_layer(&self, layer: &str, behavior: EngineBehavior) {
        self.state
            .behaviors
            .lock()
            .unwrap()
            .insert(layer.to_string(), behavior);
    }

    pub fn builds(&self) -> usize {
        self.state.builds.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RenderRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn configs(&self) -> Vec<Value> {
        self.state.configs.lock().unwrap().clone()
    }
}

impl EngineFactory for FakeEngineFactory {
    fn build(&self, config: Value) -> Result<Box<dyn RenderEngine>, RenderError> {
        self.state.builds.fetch_add(1, Ordering::SeqCst);
        self.state.configs.lock().unwrap().push(config);
        Ok(Box::new(FakeEngine {
            state: self.state.clone(),
        }))
    }
}

struct FakeEngine {
    state: Arc<EngineState>,
}

#[async_trait]
impl RenderEngine for FakeEngine {
    async fn handle(
        &self,
        request: &RenderRequest,
    ) -> Result<Option<RenderResponse>, RenderError> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        self.state.requests.lock().unwrap().push(request.clone());

        let layer = GetMapRequest::from_query_string(&request.query)?.layers;
        let behavior = self.state.behaviors.lock().unwrap().get(&layer).cloned();
        let png = vec![("content-type".to_string(), "image/png".to_string())];

        match behavior {
            Some(EngineBehavior::Image(bytes)) => {
                Ok(Some(RenderResponse::single_chunk(200, png, bytes)))
            }
            Some(EngineBehavior::Fail) => Err(RenderError::Body("engine exploded".to_string())),
            Some(EngineBehavior::NoResponse) => Ok(None),
            Some(EngineBehavior::Status(status)) => Ok(Some(RenderResponse::single_chunk(
                status,
                png,
                test_utils::gradient_png(4, 4),
            ))),
            Some(EngineBehavior::EmptyBody) => Ok(Some(RenderResponse::new(
                200,
                png,
                stream::empty::<Result<Bytes, RenderError>>().boxed(),
            ))),
            Some(EngineBehavior::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(None)
            }
            None => Ok(Some(RenderResponse::single_chunk(
                404,
                Vec::new(),
                "LayerNotDefined",
            ))),
        }
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Pipeline over fakes with caches in a fresh temp directory.
pub struct Harness {
    pub dir: TempDir,
    pub registry: Arc<FakeRegistry>,
    pub engines: FakeEngineFactory,
    pub config: CheckConfig,
}

impl Harness {
    pub fn new() -> Self {
        let dir = test_utils::temp_cache_dir();
        let config = CheckConfig {
            registry_url: REGISTRY_URL.to_string(),
            config_dir: dir.path().join("yml"),
            image_dir: dir.path().join("png"),
            render_timeout_secs: 5,
            ..Default::default()
        };
        Self {
            dir,
            registry: Arc::new(FakeRegistry::default()),
            engines: FakeEngineFactory::default(),
            config,
        }
    }

    pub fn with_fatal_policy(mut self, on_fatal: FatalPolicy) -> Self {
        self.config.on_fatal = on_fatal;
        self
    }

    pub fn pipeline(&self) -> ValidationPipeline {
        ValidationPipeline::from_config(
            &self.config,
            self.registry.clone(),
            Arc::new(self.engines.clone()),
        )
        .unwrap()
    }

    pub fn config_path(&self, id: &str) -> PathBuf {
        self.config.config_dir.join(format!("{}.yml", id))
    }

    pub fn image_path(&self, id: &str) -> PathBuf {
        self.config.image_dir.join(format!("{}.png", id))
    }

    /// Run the pipeline over `input` and return its text output.
    pub async fn run(&self, input: &str) -> (String, RunSummary) {
        self.run_as(input, OutputFormat::Text).await
    }

    pub async fn run_as(&self, input: &str, format: OutputFormat) -> (String, RunSummary) {
        self.run_bytes_as(input.as_bytes(), format).await
    }

    pub async fn run_bytes(&self, input: &[u8]) -> (String, RunSummary) {
        self.run_bytes_as(input, OutputFormat::Text).await
    }

    async fn run_bytes_as(&self, input: &[u8], format: OutputFormat) -> (String, RunSummary) {
        let mut output = Vec::new();
        let summary = self
            .pipeline()
            .run(input, &mut output, format)
            .await
            .unwrap();
        (String::from_utf8(output).unwrap(), summary)
    }
}
