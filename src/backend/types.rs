//! Backend request/response types.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::params::RequestPayload;

pub const DEFAULT_BASE_URL: &str = "https://api.replicate.com";
pub const DEFAULT_MODEL: &str = "minimax/speech-02-hd";

/// Errors that can occur when talking to the inference API.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything one synthesis call needs to know about the service.
///
/// Passed explicitly to every call, so no credential lives in process-wide state.
#[derive(Clone)]
pub struct ClientConfig {
    pub api_token: String,
    pub base_url: String,
    pub model: String,
    /// Delay between status checks when the prediction outlives the wait window.
    pub poll_interval: Duration,
}

impl ClientConfig {
    /// Create a config for the default service and model.
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            poll_interval: Duration::from_secs(1),
        }
    }

    /// Set the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the model, as `owner/name`.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Endpoint that creates a prediction for the configured model.
    pub fn predictions_url(&self) -> String {
        format!(
            "{}/v1/models/{}/predictions",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

/// Body of a create-prediction call.
#[derive(Debug, Serialize)]
pub struct PredictionRequest<'a> {
    pub input: &'a RequestPayload,
}

/// Lifecycle state of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    /// Whether polling can stop. An unrecognized status is never followed.
    pub fn is_terminal(self) -> bool {
        !matches!(self, PredictionStatus::Starting | PredictionStatus::Processing)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionUrls {
    pub get: Option<String>,
}

/// A prediction as returned by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub urls: Option<PredictionUrls>,
}

impl Prediction {
    /// URL of the produced audio: a plain string, or the first string of a list.
    pub fn output_url(&self) -> Option<&str> {
        match self.output.as_ref()? {
            Value::String(url) => Some(url.as_str()),
            Value::Array(items) => items.iter().find_map(Value::as_str),
            _ => None,
        }
    }

    /// Link for re-reading this prediction's status.
    pub fn poll_url(&self) -> Option<&str> {
        self.urls.as_ref()?.get.as_deref()
    }

    pub fn error_message(&self) -> String {
        match &self.error {
            Some(Value::String(msg)) => msg.clone(),
            Some(Value::Null) | None => format!("prediction {} ended as {:?}", self.id, self.status),
            Some(other) => other.to_string(),
        }
    }
}

/// A downloaded synthesis result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisResult {
    pub source_url: String,
    pub path: PathBuf,
}
