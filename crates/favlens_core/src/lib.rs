//! Favlens core: pure candidate parsing, configuration and verdict logic.
mod candidates;
mod config;
mod job;
mod summary;
mod verdict;

pub use candidates::{parse_candidates, with_favicon_path, IMAGE_SUFFIXES};
pub use config::{
    ConfigError, RunConfig, DEFAULT_MAX_IMAGE_BYTES, DEFAULT_MODEL, DEFAULT_OLLAMA_HOST,
    DEFAULT_TIMEOUT, DEFAULT_WORKERS,
};
pub use engine_logging::Verbosity;
pub use job::{CandidateJob, JobId, Stage};
pub use summary::{JobResultKind, RunSummary};
pub use verdict::{
    classify, compare_prompt, ComparisonVerdict, MatchMode, AFFIRMATIVE_TOKEN, NEGATIVE_TOKEN,
};
