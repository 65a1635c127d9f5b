//! HTTP client for the Replicate predictions API.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};

use super::Synthesizer;
use super::types::{BackendError, ClientConfig, Prediction, PredictionRequest, PredictionStatus};
use crate::params::RequestPayload;

const CHUNK_SIZE: usize = 8192;

/// Replicate-backed synthesizer.
pub struct ReplicateClient {
    client: Client,
}

impl ReplicateClient {
    /// Create a client. `timeout` bounds each whole HTTP exchange; `None` disables it.
    pub fn new(timeout: Option<Duration>) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client })
    }

    fn authorized(&self, builder: RequestBuilder, config: &ClientConfig) -> RequestBuilder {
        builder.bearer_auth(&config.api_token)
    }

    /// Create a prediction, letting the service hold the connection until it finishes.
    fn create_prediction(
        &self,
        config: &ClientConfig,
        payload: &RequestPayload,
    ) -> Result<Prediction, BackendError> {
        let url = config.predictions_url();
        log::debug!("POST {url}");

        let response = self
            .authorized(self.client.post(&url), config)
            .header("Prefer", "wait")
            .json(&PredictionRequest { input: payload })
            .send()
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;

        read_prediction(response)
    }

    fn get_prediction(&self, config: &ClientConfig, url: &str) -> Result<Prediction, BackendError> {
        let response = self
            .authorized(self.client.get(url), config)
            .send()
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;

        read_prediction(response)
    }
}

impl Synthesizer for ReplicateClient {
    fn synthesize(
        &self,
        config: &ClientConfig,
        payload: &RequestPayload,
    ) -> Result<String, BackendError> {
        let mut prediction = self.create_prediction(config, payload)?;

        // The wait window closed before the model finished; follow the prediction.
        while !prediction.status.is_terminal() {
            let poll_url = prediction
                .poll_url()
                .ok_or_else(|| {
                    BackendError::InvalidResponse(format!(
                        "prediction {} is {:?} but has no status link",
                        prediction.id, prediction.status
                    ))
                })?
                .to_string();
            log::debug!("Prediction {} still {:?}", prediction.id, prediction.status);
            thread::sleep(config.poll_interval);
            prediction = self.get_prediction(config, &poll_url)?;
        }

        match prediction.status {
            PredictionStatus::Succeeded => {}
            PredictionStatus::Unknown => {
                return Err(BackendError::InvalidResponse(format!(
                    "prediction {} has an unrecognized status",
                    prediction.id
                )));
            }
            _ => return Err(BackendError::PredictionFailed(prediction.error_message())),
        }

        prediction
            .output_url()
            .map(str::to_string)
            .ok_or_else(|| BackendError::InvalidResponse("No audio URL in response".to_string()))
    }

    fn download(&self, url: &str, dest: &Path) -> Result<u64, BackendError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::RequestFailed(format!(
                "Download failed: {}",
                response.status()
            )));
        }

        let result = write_body(response, dest);
        if result.is_err() {
            let _ = std::fs::remove_file(dest);
        }
        result
    }
}

fn read_prediction(response: Response) -> Result<Prediction, BackendError> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        let body = response.text().unwrap_or_default();
        return Err(BackendError::Unauthorized(format!("{status}: {body}")));
    }

    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(BackendError::RequestFailed(format!("Status: {status}: {body}")));
    }

    response
        .json()
        .map_err(|e| BackendError::InvalidResponse(e.to_string()))
}

/// Stream the response body into a new file at `dest`, chunk by chunk.
fn write_body(mut response: Response, dest: &Path) -> Result<u64, BackendError> {
    let mut file = File::create(dest)?;
    let mut buf = [0u8; CHUNK_SIZE];
    let mut written = 0u64;

    loop {
        let n = response
            .read(&mut buf)
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])?;
        written += n as u64;
    }

    file.flush()?;
    Ok(written)
}
