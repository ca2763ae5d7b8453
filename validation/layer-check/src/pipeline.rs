//! The four-stage validation pipeline.
//!
//! Stages run in a fixed order and each one is gated by the previous:
//! config, bbox, image, color. A stage that fails or never runs is reported
//! as `1`. Identifiers are independent; with `concurrency > 1` several are in
//! flight at once but results are still written in input order.

use std::pin::pin;
use std::sync::Arc;

use futures::future;
use futures::stream::{self, StreamExt};
use renderer::{load_base_config, EngineFactory};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, instrument};
use wms_common::{LayerId, LayerIdError};

use crate::document::validate_bbox;
use crate::{
    CheckConfig, CheckError, CheckResult, ConfigFetcher, FatalPolicy, ImageClassifier,
    LayerDocument, OutputFormat, PreviewRenderer, Registry, ResultsReport, ValidationResult,
};

/// Outcome of checking one identifier.
#[derive(Debug)]
pub struct CheckReport {
    pub result: ValidationResult,
    /// Set when a stage hit a fatal error; later stages were not run.
    pub fatal: Option<CheckError>,
}

/// Totals for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub checked: usize,
    pub healthy: usize,
    pub fatal: usize,
}

pub struct ValidationPipeline {
    fetcher: ConfigFetcher,
    renderer: PreviewRenderer,
    classifier: ImageClassifier,
    concurrency: usize,
    on_fatal: FatalPolicy,
}

impl ValidationPipeline {
    pub fn new(
        fetcher: ConfigFetcher,
        renderer: PreviewRenderer,
        classifier: ImageClassifier,
    ) -> Self {
        Self {
            fetcher,
            renderer,
            classifier,
            concurrency: 1,
            on_fatal: FatalPolicy::Isolate,
        }
    }

    /// Wire up every stage from `config`.
    pub fn from_config(
        config: &CheckConfig,
        registry: Arc<dyn Registry>,
        factory: Arc<dyn EngineFactory>,
    ) -> anyhow::Result<Self> {
        let base_config = load_base_config(config.base_config.as_deref())?;

        let fetcher = ConfigFetcher::new(
            registry,
            config.registry_url.clone(),
            config.config_dir.clone(),
            config.config_ext.clone(),
            config.error_page_marker.clone(),
        );
        let renderer = PreviewRenderer::new(
            factory,
            base_config,
            config.image_dir.clone(),
            config.image_ext.clone(),
            config.render_timeout(),
        );
        let classifier = ImageClassifier::new(config.image_dir.clone(), config.image_ext.clone());

        Ok(Self::new(fetcher, renderer, classifier)
            .with_concurrency(config.concurrency)
            .with_fatal_policy(config.on_fatal))
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_fatal_policy(mut self, on_fatal: FatalPolicy) -> Self {
        self.on_fatal = on_fatal;
        self
    }

    /// Run every stage for one identifier.
    #[instrument(skip(self, id), fields(layer_id = %id))]
    pub async fn check(&self, id: &str) -> CheckReport {
        let mut result = ValidationResult::failed(id);
        let fatal = self.run_stages(id, &mut result).await.err();
        if let Some(err) = &fatal {
            error!(error = %err, "Layer check stopped");
        }
        CheckReport { result, fatal }
    }

    async fn check_line(&self, line: Vec<u8>) -> CheckReport {
        match String::from_utf8(line) {
            Ok(line) => self.check(line.trim_end()).await,
            Err(err) => {
                let id = String::from_utf8_lossy(err.as_bytes()).trim_end().to_string();
                let err = CheckError::InvalidIdentifier(LayerIdError::NotUtf8(id.clone()));
                error!(layer_id = %id, error = %err, "Layer check stopped");
                CheckReport {
                    result: ValidationResult::failed(id),
                    fatal: Some(err),
                }
            }
        }
    }

    async fn run_stages(&self, id: &str, result: &mut ValidationResult) -> CheckResult<()> {
        let id = LayerId::parse(id)?;

        result.config = self.fetcher.fetch(&id).await?;
        if !result.config.is_valid() {
            debug!("No usable configuration, skipping remaining stages");
            return Ok(());
        }

        let document = LayerDocument::load(&id, &self.fetcher.path(&id)).await?;
        result.bbox = validate_bbox(&document)?;
        if !result.bbox.is_valid() {
            debug!("Invalid bbox, skipping render");
            return Ok(());
        }

        result.image = self.renderer.render(&id, &document).await?;
        if !result.image.is_valid() {
            debug!("No preview, skipping classification");
            return Ok(());
        }

        result.color = self.classifier.classify(&id).await?;
        Ok(())
    }

    /// Check every identifier read from `input`, one per line, and write one
    /// result line per identifier to `output` in input order.
    ///
    /// Blank lines are skipped and trailing whitespace is dropped. A line that
    /// is not UTF-8 is an invalid identifier. Under `FatalPolicy::Abort` the
    /// first fatal error ends the run; its identifier gets no result line.
    pub async fn run<R, W>(
        &self,
        input: R,
        mut output: W,
        format: OutputFormat,
    ) -> CheckResult<RunSummary>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        // Raw bytes per line, so one undecodable line cannot end the stream
        let lines = stream::unfold(Some(input), |state| async move {
            let Some(mut input) = state else {
                return None;
            };
            let mut line = Vec::new();
            match input.read_until(b'\n', &mut line).await {
                Ok(0) => None,
                Ok(_) => {
                    if line.last() == Some(&b'\n') {
                        line.pop();
                    }
                    Some((Ok(line), Some(input)))
                }
                Err(err) => Some((Err(err), None)),
            }
        });

        let reports = lines
            .filter(|line| {
                let blank =
                    matches!(line, Ok(line) if String::from_utf8_lossy(line).trim().is_empty());
                future::ready(!blank)
            })
            .map(|line| async move {
                match line {
                    Ok(line) => Ok(self.check_line(line).await),
                    Err(err) => Err(err),
                }
            })
            .buffered(self.concurrency);
        let mut reports = pin!(reports);

        if format == OutputFormat::Csv {
            write_line(&mut output, ResultsReport::csv_header()).await?;
        }

        let mut summary = RunSummary::default();
        while let Some(report) = reports.next().await {
            let report = report.map_err(|e| CheckError::io("<input>", e))?;

            summary.checked += 1;
            if let Some(err) = report.fatal {
                summary.fatal += 1;
                if self.on_fatal == FatalPolicy::Abort {
                    error!(layer_id = %report.result.id, "Aborting run on fatal error");
                    return Err(err);
                }
            }
            if report.result.is_healthy() {
                summary.healthy += 1;
            }

            let line = ResultsReport::format(&report.result, format)?;
            write_line(&mut output, &line).await?;
        }

        info!(
            checked = summary.checked,
            healthy = summary.healthy,
            fatal = summary.fatal,
            "Layer check complete"
        );
        Ok(summary)
    }
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, line: &str) -> CheckResult<()> {
    let write = async {
        output.write_all(line.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await
    };
    write.await.map_err(|e| CheckError::io("<output>", e))
}
