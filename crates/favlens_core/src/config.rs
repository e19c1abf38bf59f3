use std::path::PathBuf;
use std::time::Duration;

use engine_logging::Verbosity;
use url::Url;

use crate::MatchMode;

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "gemma3:4b";
pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Everything a run needs, fully populated before any work starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// URL of the reference image every candidate is compared against.
    pub base_url: String,
    /// File with one candidate URL per line.
    pub input_path: PathBuf,
    pub ollama_host: String,
    pub model: String,
    pub workers: usize,
    /// Per network operation, not per run.
    pub timeout: Duration,
    /// Pause before each candidate fetch.
    pub delay: Duration,
    /// Matched URLs are appended here as well as printed.
    pub output: Option<PathBuf>,
    pub verbosity: Verbosity,
    pub match_mode: MatchMode,
    pub max_image_bytes: u64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("base reference URL is required")]
    MissingBaseUrl,
    #[error("input file path is required")]
    MissingInputPath,
    #[error("model name is required")]
    MissingModel,
    #[error("invalid inference host {host:?}: {message}")]
    InvalidOllamaHost { host: String, message: String },
    #[error("worker count must be at least 1")]
    NoWorkers,
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
}

impl RunConfig {
    pub fn new(base_url: impl Into<String>, input_path: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into(),
            input_path: input_path.into(),
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            workers: DEFAULT_WORKERS,
            timeout: DEFAULT_TIMEOUT,
            delay: Duration::ZERO,
            output: None,
            verbosity: Verbosity::default(),
            match_mode: MatchMode::default(),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        if self.input_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingInputPath);
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::MissingModel);
        }
        validate_host(&self.ollama_host)?;
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Inference host without a trailing slash, ready for path joining.
    pub fn ollama_base(&self) -> &str {
        self.ollama_host.trim_end_matches('/')
    }
}

fn validate_host(host: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::InvalidOllamaHost {
        host: host.to_string(),
        message,
    };
    let parsed = Url::parse(host).map_err(|err| invalid(err.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme {other}"))),
    }
}
