use std::time::Duration;

use engine_logging::{engine_debug, engine_trace};
use favlens_core::{classify, compare_prompt, ComparisonVerdict, MatchMode};
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::normalize::NormalizedImage;
use crate::stream::ResponseAssembler;

const LATEST_SUFFIX: &str = ":latest";

#[derive(Debug, Clone)]
pub struct OllamaSettings {
    /// Base URL of the inference host, e.g. `http://localhost:11434`.
    pub host: String,
    pub model: String,
    pub timeout: Duration,
    pub match_mode: MatchMode,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("failed to connect to inference host at {host}: {message}")]
    Unreachable { host: String, message: String },
    #[error("inference host returned status {0}")]
    HttpStatus(u16),
    #[error("failed to parse models response: {0}")]
    InvalidListing(String),
    #[error("model '{model}' not found. Available models: {available:?}")]
    NotFound {
        model: String,
        available: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompareError {
    #[error("chat request failed: {0}")]
    Request(String),
    #[error("chat request timed out: {0}")]
    Timeout(String),
    #[error("failed to encode chat request: {0}")]
    Encode(String),
}

#[async_trait::async_trait]
pub trait Comparator: Send + Sync {
    async fn compare(
        &self,
        reference: &NormalizedImage,
        candidate: &NormalizedImage,
    ) -> Result<ComparisonVerdict, CompareError>;
}

/// One entry of the `/api/tags` listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub details: ModelDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ModelDetails {
    #[serde(default)]
    pub family: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
    images: Vec<&'a str>,
}

/// Equal names, or equal once a `:latest` tag is dropped from either side.
pub fn model_matches(requested: &str, available: &str) -> bool {
    requested == available || strip_latest(requested) == strip_latest(available)
}

fn strip_latest(name: &str) -> &str {
    name.strip_suffix(LATEST_SUFFIX).unwrap_or(name)
}

/// Client for an Ollama-compatible inference host.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    host: String,
    model: String,
    prompt: String,
    match_mode: MatchMode,
}

impl OllamaClient {
    pub fn new(settings: OllamaSettings) -> Result<Self, ModelError> {
        let host = settings.host.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .connect_timeout(settings.timeout)
            .timeout(settings.timeout)
            .build()
            .map_err(|err| ModelError::Unreachable {
                host: host.clone(),
                message: err.to_string(),
            })?;
        Ok(Self {
            http,
            host,
            model: settings.model,
            prompt: compare_prompt(),
            match_mode: settings.match_mode,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Confirms the configured model is served by the host.
    pub async fn check_model_available(&self) -> Result<ModelInfo, ModelError> {
        engine_debug!("Checking if model '{}' exists on {}", self.model, self.host);
        let url = format!("{}/api/tags", self.host);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| ModelError::Unreachable {
                host: self.host.clone(),
                message: err.to_string(),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ModelError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| ModelError::Unreachable {
                host: self.host.clone(),
                message: err.to_string(),
            })?;
        let listing: TagsResponse = serde_json::from_slice(&body)
            .map_err(|err| ModelError::InvalidListing(err.to_string()))?;

        match listing
            .models
            .iter()
            .find(|candidate| model_matches(&self.model, &candidate.name))
        {
            Some(found) => {
                engine_debug!(
                    "Found model: {} (size: {} bytes, family: {})",
                    found.name,
                    found.size,
                    found.details.family
                );
                Ok(found.clone())
            }
            None => Err(ModelError::NotFound {
                model: self.model.clone(),
                available: listing.models.into_iter().map(|m| m.name).collect(),
            }),
        }
    }
}

#[async_trait::async_trait]
impl Comparator for OllamaClient {
    async fn compare(
        &self,
        reference: &NormalizedImage,
        candidate: &NormalizedImage,
    ) -> Result<ComparisonVerdict, CompareError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &self.prompt,
                images: vec![reference.as_base64(), candidate.as_base64()],
            }],
            stream: true,
        };
        let body =
            serde_json::to_vec(&request).map_err(|err| CompareError::Encode(err.to_string()))?;
        engine_trace!("Sending chat request, payload size: {} bytes", body.len());

        let response = self
            .http
            .post(format!("{}/api/chat", self.host))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_compare_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            engine_debug!("Chat request returned status {}", status);
        }

        let mut assembler = ResponseAssembler::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_compare_error)?;
            if assembler.feed(&chunk) {
                break;
            }
        }

        let answer = assembler.finish();
        if !answer.completed {
            engine_trace!("Chat stream ended without a done record");
        }
        engine_trace!("Model response: {:?}", answer.text);
        Ok(classify(&answer.text, self.match_mode))
    }
}

fn map_compare_error(err: reqwest::Error) -> CompareError {
    if err.is_timeout() {
        CompareError::Timeout(err.to_string())
    } else {
        CompareError::Request(err.to_string())
    }
}
