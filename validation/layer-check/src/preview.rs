//! Rendering a preview image for a layer.
//!
//! The preview is a fixed-shape GetMap (200x150 PNG, EPSG:4326, transparent)
//! handed to an in-process rendering engine built from the base configuration
//! merged with the layer's own document.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use renderer::{
    merge_config, EngineFactory, RenderEngine, RenderError, RenderRequest, SERVICE_PATH,
};
use serde_yaml::Value;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use wms_common::LayerId;
use wms_protocol::GetMapRequest;

use crate::fetcher::file_exists;
use crate::{contains_bytes, Check, CheckError, CheckResult, LayerDocument};

/// Byte marker of an in-band error image.
const IN_BAND_ERROR_MARKER: &[u8] = b"error";

/// Reasons a render produced no image. All of them are `Check::Invalid`.
#[derive(Debug, Error)]
enum RenderFailure {
    #[error("preview request could not be built: {0}")]
    Request(RenderError),

    #[error("rendering engine could not be built: {0}")]
    Build(RenderError),

    #[error("rendering engine failed: {0}")]
    Engine(RenderError),

    #[error("rendering engine returned no response")]
    NoResponse,

    #[error("rendering engine returned status {0}")]
    Status(u16),

    #[error("rendering engine returned an empty body")]
    EmptyBody,

    #[error("rendering timed out after {0:?}")]
    Timeout(Duration),
}

pub struct PreviewRenderer {
    factory: Arc<dyn EngineFactory>,
    base_config: Value,
    image_dir: PathBuf,
    image_ext: String,
    timeout: Duration,
}

impl PreviewRenderer {
    pub fn new(
        factory: Arc<dyn EngineFactory>,
        base_config: Value,
        image_dir: impl Into<PathBuf>,
        image_ext: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            factory,
            base_config,
            image_dir: image_dir.into(),
            image_ext: image_ext.into(),
            timeout,
        }
    }

    pub fn image_path(&self, id: &LayerId) -> PathBuf {
        self.image_dir.join(id.file_name(&self.image_ext))
    }

    /// Render and store the preview for `id`.
    ///
    /// An existing image is trusted without re-rendering. A document without
    /// `layers[0].name` is fatal; every rendering problem is `Check::Invalid`.
    #[instrument(skip(self, id, document), fields(layer_id = %id))]
    pub async fn render(&self, id: &LayerId, document: &LayerDocument) -> CheckResult<Check> {
        let path = self.image_path(id);
        if file_exists(&path).await? {
            debug!(path = %path.display(), "Preview already rendered, skipping render");
            return Ok(Check::Valid);
        }

        let layer = document.primary_layer_name()?;
        let request = GetMapRequest::preview(&layer, document.preview_bbox());

        let image = match self.render_image(document, &request).await {
            Ok(image) => image,
            Err(failure) => {
                warn!(layer = %layer, error = %failure, "Preview render failed");
                return Ok(Check::Invalid);
            }
        };

        if let Err(err) = self.store(&path, &image).await {
            warn!(path = %path.display(), error = %err, "Failed to store preview");
            return Ok(Check::Invalid);
        }

        // Engines may answer with an error image instead of failing
        let stored = tokio::fs::read(&path)
            .await
            .map_err(|e| CheckError::io(&path, e))?;
        if contains_bytes(&stored, IN_BAND_ERROR_MARKER) {
            warn!(path = %path.display(), "Preview carries an in-band error, discarding");
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| CheckError::io(&path, e))?;
            return Ok(Check::Invalid);
        }

        info!(path = %path.display(), bytes = image.len(), "Rendered preview");
        Ok(Check::Valid)
    }

    async fn render_image(
        &self,
        document: &LayerDocument,
        get_map: &GetMapRequest,
    ) -> Result<Bytes, RenderFailure> {
        let request =
            RenderRequest::get_map(SERVICE_PATH, get_map).map_err(RenderFailure::Request)?;
        let config = merge_config(self.base_config.clone(), document.as_value().clone());
        let engine = self.factory.build(config).map_err(RenderFailure::Build)?;

        debug!(uri = %request.uri(), "Invoking rendering engine");
        tokio::time::timeout(self.timeout, first_chunk(engine.as_ref(), &request))
            .await
            .map_err(|_| RenderFailure::Timeout(self.timeout))?
    }

    async fn store(&self, path: &Path, image: &Bytes) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.image_dir).await?;
        tokio::fs::write(path, image).await
    }
}

/// Invoke `engine` and take the first body chunk of a successful response.
async fn first_chunk(
    engine: &dyn RenderEngine,
    request: &RenderRequest,
) -> Result<Bytes, RenderFailure> {
    let mut response = engine
        .handle(request)
        .await
        .map_err(RenderFailure::Engine)?
        .ok_or(RenderFailure::NoResponse)?;
    if !response.is_success() {
        return Err(RenderFailure::Status(response.status));
    }
    match response.next_chunk().await {
        Some(Ok(chunk)) if !chunk.is_empty() => Ok(chunk),
        Some(Ok(_)) | None => Err(RenderFailure::EmptyBody),
        Some(Err(err)) => Err(RenderFailure::Engine(err)),
    }
}
