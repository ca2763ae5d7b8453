//! Layer health-check CLI.
//!
//! Reads layer identifiers one per line and prints
//! `id validBbox validConfig validImage validColor` for each (0 = valid).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use layer_check::{CheckConfig, FatalPolicy, HttpRegistry, OutputFormat, ValidationPipeline};
use renderer::ProxyEngineFactory;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "layer-check")]
#[command(about = "Health check for registered map layers", long_about = None)]
struct Cli {
    /// File of layer identifiers, one per line (default: stdin)
    input: Option<PathBuf>,

    /// Path to a YAML configuration file
    #[arg(short, long, env = "LAYER_CHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Registry base URL
    #[arg(long, env = "LAYER_CHECK_REGISTRY_URL")]
    registry_url: Option<String>,

    /// Directory for cached configuration documents
    #[arg(long, env = "LAYER_CHECK_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Directory for rendered previews
    #[arg(long, env = "LAYER_CHECK_IMAGE_DIR")]
    image_dir: Option<PathBuf>,

    /// Base rendering configuration merged under every layer document
    #[arg(long, env = "LAYER_CHECK_BASE_CONFIG")]
    base_config: Option<PathBuf>,

    /// Identifiers checked at once
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Registry request timeout in seconds
    #[arg(long)]
    request_timeout: Option<u64>,

    /// Preview render timeout in seconds
    #[arg(long)]
    render_timeout: Option<u64>,

    /// What a fatal error for one identifier does to the run
    #[arg(long, value_enum)]
    on_fatal: Option<FatalPolicy>,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Log level
    #[arg(long, default_value = "info", env = "LAYER_CHECK_LOG_LEVEL")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn load_config(&self) -> Result<CheckConfig> {
        let mut config = match &self.config {
            Some(path) => CheckConfig::from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => CheckConfig::default(),
        };

        // Apply overrides
        if let Some(url) = &self.registry_url {
            config.registry_url = url.clone();
        }
        if let Some(dir) = &self.config_dir {
            config.config_dir = dir.clone();
        }
        if let Some(dir) = &self.image_dir {
            config.image_dir = dir.clone();
        }
        if let Some(path) = &self.base_config {
            config.base_config = Some(path.clone());
        }
        if let Some(c) = self.concurrency {
            config.concurrency = c;
        }
        if let Some(t) = self.request_timeout {
            config.request_timeout_secs = t;
        }
        if let Some(t) = self.render_timeout {
            config.render_timeout_secs = t;
        }
        if let Some(policy) = self.on_fatal {
            config.on_fatal = policy;
        }
        if let Some(output) = self.output {
            config.output = output;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json)?;

    let config = cli.load_config()?;
    info!(
        registry_url = %config.registry_url,
        config_dir = %config.config_dir.display(),
        image_dir = %config.image_dir.display(),
        concurrency = config.concurrency,
        "Starting layer check"
    );

    let registry = Arc::new(HttpRegistry::new(config.request_timeout())?);
    let factory = Arc::new(ProxyEngineFactory::new(reqwest::Client::new()));
    let pipeline = ValidationPipeline::from_config(&config, registry, factory)?;

    let input: Box<dyn AsyncBufRead + Unpin> = match &cli.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let summary = pipeline
        .run(input, tokio::io::stdout(), config.output)
        .await?;

    if summary.fatal > 0 {
        warn!(fatal = summary.fatal, "Some layers could not be checked");
    }
    Ok(())
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Result lines own stdout
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}
