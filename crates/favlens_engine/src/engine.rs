use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use engine_logging::engine_info;
use favlens_core::{parse_candidates, ConfigError, RunConfig, RunSummary};

use crate::aggregate::{console_sink, open_output_file, Aggregator, MatchSink};
use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::normalize::{format_label, normalize_image, DecodeError, NormalizedImage};
use crate::ollama::{ModelError, OllamaClient, OllamaSettings};
use crate::pool::{PoolSettings, WorkerPool};
use crate::FetchError;

/// Preconditions that stop a run before any worker starts.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("model validation failed: {0}")]
    Model(#[from] ModelError),
    #[error("failed to build http client: {0}")]
    Client(FetchError),
    #[error("failed to download base image: {0}")]
    ReferenceFetch(FetchError),
    #[error("failed to decode base image: {0}")]
    ReferenceDecode(DecodeError),
    #[error("failed to read input file {path:?}: {source}")]
    InputRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to open output file {path:?}: {source}")]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One comparison run: preflight checks, then the worker pool and aggregator.
pub struct Engine {
    config: RunConfig,
    console: Box<dyn MatchSink>,
}

impl Engine {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            console: Box::new(console_sink()),
        }
    }

    /// Replaces stdout as the console destination for matches.
    pub fn with_console(mut self, console: Box<dyn MatchSink>) -> Self {
        self.console = console;
        self
    }

    pub async fn run(self) -> Result<RunSummary, RunError> {
        let Engine { config, console } = self;
        config.validate()?;

        let ollama = OllamaClient::new(OllamaSettings {
            host: config.ollama_base().to_string(),
            model: config.model.clone(),
            timeout: config.timeout,
            match_mode: config.match_mode,
        })?;
        engine_info!("Validating model '{}' availability...", config.model);
        ollama.check_model_available().await?;
        engine_info!("Model '{}' is available", config.model);

        let fetcher = ReqwestFetcher::new(FetchSettings {
            max_bytes: config.max_image_bytes,
            ..FetchSettings::with_timeout(config.timeout)
        })
        .map_err(RunError::Client)?;

        engine_info!("Downloading base image...");
        let reference = prepare_reference(&fetcher, &config.base_url).await?;
        engine_info!(
            "Base image downloaded successfully ({}, {}x{})",
            format_label(reference.source_format()),
            reference.dimensions().0,
            reference.dimensions().1
        );

        engine_info!("Reading URLs from file: {}", config.input_path.display());
        let raw = tokio::fs::read_to_string(&config.input_path)
            .await
            .map_err(|source| RunError::InputRead {
                path: config.input_path.clone(),
                source,
            })?;
        let jobs = parse_candidates(&raw);
        engine_info!("Found {} URLs to process", jobs.len());

        let mut aggregator = Aggregator::new(config.verbosity).with_sink(console);
        if let Some(path) = &config.output {
            let sink = open_output_file(path).map_err(|source| RunError::OutputOpen {
                path: path.clone(),
                source,
            })?;
            engine_info!("Writing matches to: {}", path.display());
            aggregator = aggregator.with_sink(Box::new(sink));
        }

        engine_info!("Starting {} workers...", config.workers);
        let pool = WorkerPool::new(
            Arc::new(fetcher),
            Arc::new(ollama),
            reference,
            PoolSettings {
                concurrency: config.workers,
                delay: config.delay,
            },
        );
        let summary = aggregator.consume(pool.run(jobs)).await;

        engine_info!("Processing complete. {}", summary);
        if let Some(path) = &config.output {
            engine_info!("Matched URLs saved to: {}", path.display());
        }
        Ok(summary)
    }
}

/// Fetches and normalizes the base image once, before any worker starts.
pub async fn prepare_reference(
    fetcher: &dyn Fetcher,
    url: &str,
) -> Result<NormalizedImage, RunError> {
    let fetched = fetcher.fetch(url).await.map_err(RunError::ReferenceFetch)?;
    normalize_image(&fetched.bytes).map_err(RunError::ReferenceDecode)
}
