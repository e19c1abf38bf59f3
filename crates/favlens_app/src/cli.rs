use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use favlens_core::{
    MatchMode, RunConfig, Verbosity, DEFAULT_MODEL, DEFAULT_OLLAMA_HOST, DEFAULT_TIMEOUT,
    DEFAULT_WORKERS,
};

pub const USAGE_HINT: &str = "Usage: favlens --base <base_favicon_url> --file <url_list_file> \
[--model <model_name>] [--workers <num>] [--timeout <seconds>] [--delay <ms>] \
[--debug|--verbose|--silent] [-o <output_file>]";

#[derive(Debug, Parser)]
#[command(
    name = "favlens",
    version,
    about = "Compare favicons against a base URL using Ollama models"
)]
pub struct Cli {
    /// Base favicon URL to compare against
    #[arg(long)]
    pub base: Option<String>,
    /// File containing URLs to check, one per line
    #[arg(long)]
    pub file: Option<PathBuf>,
    #[arg(long, default_value = DEFAULT_OLLAMA_HOST)]
    pub ollama_host: String,
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,
    /// HTTP timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout: u64,
    /// Delay before each candidate fetch, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub delay: u64,
    /// Append matched URLs to this file
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
    /// Show everything, including per-worker tracing
    #[arg(long)]
    pub debug: bool,
    /// Show progress and per-job failures
    #[arg(long)]
    pub verbose: bool,
    /// Only print matched URLs
    #[arg(long)]
    pub silent: bool,
    /// Require the answer to be exactly "Yes"
    #[arg(long)]
    pub strict_match: bool,
    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.silent, self.verbose, self.debug)
    }

    pub fn to_config(&self) -> RunConfig {
        let mut config = RunConfig::new(
            self.base.as_deref().unwrap_or_default().trim(),
            self.file.clone().unwrap_or_default(),
        );
        config.ollama_host = self.ollama_host.trim().to_string();
        config.model = self.model.trim().to_string();
        config.workers = self.workers;
        config.timeout = Duration::from_secs(self.timeout);
        config.delay = Duration::from_millis(self.delay);
        config.output = self.output.clone();
        config.verbosity = self.verbosity();
        config.match_mode = if self.strict_match {
            MatchMode::Strict
        } else {
            MatchMode::Substring
        };
        config
    }
}
