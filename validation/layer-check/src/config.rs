//! Configuration loading and management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Marker the registry's error-page template links in; a body containing it
/// is an error page, not a configuration document.
pub const DEFAULT_ERROR_PAGE_MARKER: &str = "error-page.css";

/// Health-check configuration, loaded from YAML and overridden by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Registry base URL; configurations live at `<registry_url>/<id>/map/config`
    pub registry_url: String,
    /// Directory for fetched configuration documents
    pub config_dir: PathBuf,
    /// Directory for rendered previews
    pub image_dir: PathBuf,
    pub config_ext: String,
    pub image_ext: String,
    pub error_page_marker: String,
    /// Base rendering configuration; the built-in defaults when unset
    pub base_config: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub render_timeout_secs: u64,
    /// Identifiers checked at once. Output order never changes.
    pub concurrency: usize,
    pub on_fatal: FatalPolicy,
    pub output: OutputFormat,
}

/// What a fatal error for one identifier does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FatalPolicy {
    /// Log it, report the failed stages as `1` and move on
    #[default]
    Isolate,
    /// Stop the run with the error
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            registry_url: "http://localhost:8000/registry".to_string(),
            config_dir: PathBuf::from("yml"),
            image_dir: PathBuf::from("png"),
            config_ext: "yml".to_string(),
            image_ext: "png".to_string(),
            error_page_marker: DEFAULT_ERROR_PAGE_MARKER.to_string(),
            base_config: None,
            request_timeout_secs: 30,
            render_timeout_secs: 60,
            concurrency: 1,
            on_fatal: FatalPolicy::Isolate,
            output: OutputFormat::Text,
        }
    }
}

impl CheckConfig {
    /// Load configuration from YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CheckConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.registry_url.trim().is_empty() {
            anyhow::bail!("registry_url must not be empty");
        }
        let url = reqwest::Url::parse(&self.registry_url)
            .with_context(|| format!("registry_url is not a URL: {}", self.registry_url))?;
        if url.cannot_be_a_base() {
            anyhow::bail!("registry_url cannot hold a path: {}", self.registry_url);
        }
        if self.concurrency == 0 {
            anyhow::bail!("concurrency must be > 0");
        }
        if self.request_timeout_secs == 0 || self.render_timeout_secs == 0 {
            anyhow::bail!("timeouts must be > 0");
        }
        if self.error_page_marker.is_empty() {
            anyhow::bail!("error_page_marker must not be empty");
        }
        if self.config_ext.is_empty() || self.image_ext.is_empty() {
            anyhow::bail!("file extensions must not be empty");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }
}
