//! Fetching layer configurations from the registry.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Url};
use tracing::{debug, info, instrument, warn};
use wms_common::LayerId;

use crate::{contains_bytes, Check, CheckError, CheckResult, RegistryError};

/// Status and raw body of a registry response. Nothing else is inspected.
#[derive(Debug, Clone)]
pub struct RegistryResponse {
    pub status: u16,
    pub body: Bytes,
}

/// HTTP access to the layer registry.
#[async_trait]
pub trait Registry: Send + Sync {
    async fn get(&self, url: &str) -> Result<RegistryResponse, RegistryError>;
}

/// Registry client over reqwest.
#[derive(Clone)]
pub struct HttpRegistry {
    client: Client,
}

impl HttpRegistry {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("layer-check/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Registry for HttpRegistry {
    async fn get(&self, url: &str) -> Result<RegistryResponse, RegistryError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(RegistryResponse { status, body })
    }
}

/// Retrieves a layer's configuration and caches it as `<dir>/<id>.<ext>`.
///
/// A cached file is trusted as-is; it is never re-fetched or re-validated.
pub struct ConfigFetcher {
    registry: Arc<dyn Registry>,
    registry_url: String,
    dir: PathBuf,
    ext: String,
    error_page_marker: String,
}

impl ConfigFetcher {
    pub fn new(
        registry: Arc<dyn Registry>,
        registry_url: impl Into<String>,
        dir: impl Into<PathBuf>,
        ext: impl Into<String>,
        error_page_marker: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            registry_url: registry_url.into(),
            dir: dir.into(),
            ext: ext.into(),
            error_page_marker: error_page_marker.into(),
        }
    }

    /// Where the configuration for `id` is cached.
    pub fn path(&self, id: &LayerId) -> PathBuf {
        self.dir.join(id.file_name(&self.ext))
    }

    /// Registry URL serving the configuration for `id`.
    ///
    /// The identifier is one percent-encoded path segment, so `?`, `#` and
    /// `%` in it never reach the query or fragment.
    pub fn url(&self, id: &LayerId) -> Result<Url, RegistryError> {
        let invalid = || RegistryError::InvalidUrl(self.registry_url.clone());
        let mut url = Url::parse(&self.registry_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend([id.as_str(), "map", "config"]);
        Ok(url)
    }

    /// Fetch and cache the configuration for `id`.
    ///
    /// Non-200 responses, error pages and transport failures are
    /// `Check::Invalid`. A body that is not a YAML mapping is fatal.
    #[instrument(skip(self, id), fields(layer_id = %id))]
    pub async fn fetch(&self, id: &LayerId) -> CheckResult<Check> {
        let path = self.path(id);
        if file_exists(&path).await? {
            debug!(path = %path.display(), "Configuration already cached, skipping fetch");
            return Ok(Check::Valid);
        }

        let url = match self.url(id) {
            Ok(url) => url,
            Err(err) => {
                warn!(error = %err, "Cannot build registry URL");
                return Ok(Check::Invalid);
            }
        };
        debug!(url = %url, "Fetching layer configuration");

        let response = match self.registry.get(url.as_str()).await {
            Ok(response) => response,
            Err(err) => {
                warn!(url = %url, error = %err, "Registry unreachable");
                return Ok(Check::Invalid);
            }
        };

        if response.status != 200 {
            warn!(url = %url, status = response.status, "Registry returned non-200 status");
            return Ok(Check::Invalid);
        }

        if contains_bytes(&response.body, self.error_page_marker.as_bytes()) {
            warn!(url = %url, "Registry returned an error page");
            return Ok(Check::Invalid);
        }

        serde_yaml::from_slice::<serde_yaml::Mapping>(&response.body).map_err(|source| {
            CheckError::NotADocument {
                id: id.to_string(),
                source,
            }
        })?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CheckError::io(&self.dir, e))?;
        tokio::fs::write(&path, &response.body)
            .await
            .map_err(|e| CheckError::io(&path, e))?;

        info!(path = %path.display(), bytes = response.body.len(), "Cached layer configuration");
        Ok(Check::Valid)
    }
}

pub(crate) async fn file_exists(path: &Path) -> CheckResult<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| CheckError::io(path, e))
}
