//! Synthesis client for the hosted inference API.
//!
//! One call creates a prediction for the configured model and yields the
//! URL of the produced audio; a second streams that audio to a local file.

mod client;
mod types;

pub use client::ReplicateClient;
pub use types::{
    BackendError, ClientConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, Prediction, PredictionStatus,
    SynthesisResult,
};

use std::path::Path;

use crate::params::RequestPayload;

/// Trait for the text-to-speech service.
///
/// This trait abstracts the HTTP communication with the inference API,
/// allowing for mock implementations in tests.
#[cfg_attr(test, mockall::automock)]
pub trait Synthesizer: Send + Sync {
    /// Run one synthesis request.
    ///
    /// # Returns
    /// URL of the synthesized audio resource
    fn synthesize(
        &self,
        config: &ClientConfig,
        payload: &RequestPayload,
    ) -> Result<String, BackendError>;

    /// Stream the resource at `url` into a new file at `dest`.
    ///
    /// # Returns
    /// Number of bytes written
    fn download(&self, url: &str, dest: &Path) -> Result<u64, BackendError>;
}
