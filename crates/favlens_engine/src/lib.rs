//! Favlens engine: fetch, normalize and compare candidate images.
mod aggregate;
mod engine;
mod fetch;
mod normalize;
mod ollama;
mod pool;
mod stream;
mod types;

pub use aggregate::{console_sink, open_output_file, Aggregator, MatchSink, WriterSink};
pub use engine::{prepare_reference, Engine, RunError};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use normalize::{normalize_image, sniff_format, DecodeError, NormalizedImage};
pub use ollama::{
    model_matches, CompareError, Comparator, ModelDetails, ModelError, ModelInfo, OllamaClient,
    OllamaSettings,
};
pub use pool::{PoolSettings, WorkerPool};
pub use stream::{assemble_response, ResponseAssembler, StreamedAnswer};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput, JobError, JobResult};
