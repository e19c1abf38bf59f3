use std::fmt;

use favlens_core::{ComparisonVerdict, JobId, JobResultKind, Stage};

use crate::normalize::DecodeError;
use crate::ollama::CompareError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Status code for [`FailureKind::HttpStatus`] failures.
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            FailureKind::HttpStatus(code) => Some(code),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    EmptyBody,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::EmptyBody => write!(f, "empty body"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Why a single candidate failed. Never fatal to the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("compare failed: {0}")]
    Compare(#[from] CompareError),
    #[error("worker panicked: {0}")]
    Panicked(String),
}

impl JobError {
    /// Stage the job was in when it failed. A panic is only known as `Failed`.
    pub fn stage(&self) -> Stage {
        match self {
            JobError::Fetch(_) => Stage::Fetching,
            JobError::Decode(_) => Stage::Normalizing,
            JobError::Compare(_) => Stage::Comparing,
            JobError::Panicked(_) => Stage::Failed,
        }
    }
}

/// Exactly one per candidate job, produced by the worker that ran it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub job_id: JobId,
    pub url: String,
    pub outcome: Result<ComparisonVerdict, JobError>,
}

impl JobResult {
    pub fn kind(&self) -> JobResultKind {
        match &self.outcome {
            Ok(verdict) if verdict.is_match => JobResultKind::Matched,
            Ok(_) => JobResultKind::NotMatched,
            Err(_) => JobResultKind::Failed,
        }
    }

    pub fn is_match(&self) -> bool {
        self.kind() == JobResultKind::Matched
    }

    pub fn error(&self) -> Option<&JobError> {
        self.outcome.as_ref().err()
    }
}
