//! Application settings, read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::backend::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::i18n::DEFAULT_LANGUAGE;

pub const APP_NAME: &str = "minimax-speech-rs";

const ENV_LANGS_DIR: &str = "MINIMAX_SPEECH_LANGS_DIR";
const ENV_TEMP_DIR: &str = "MINIMAX_SPEECH_TEMP_DIR";
const ENV_LANGUAGE: &str = "MINIMAX_SPEECH_LANGUAGE";
const ENV_MODEL: &str = "MINIMAX_SPEECH_MODEL";
const ENV_HTTP_TIMEOUT: &str = "MINIMAX_SPEECH_HTTP_TIMEOUT_SECS";
const ENV_API_BASE: &str = "REPLICATE_API_BASE";
const ENV_API_TOKEN: &str = "REPLICATE_API_TOKEN";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

/// Errors that can occur while reading settings.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Settings for one run of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Directory holding `<code>.json` language files.
    pub langs_dir: PathBuf,
    /// Directory for the generated audio; removed on exit.
    pub temp_dir: PathBuf,
    /// Language code shown at startup.
    pub language: String,
    pub api_base: String,
    pub model: String,
    /// `None` disables the HTTP timeout.
    pub http_timeout: Option<Duration>,
    /// Pre-fills the credential field.
    pub api_token: Option<String>,
}

impl AppConfig {
    /// Read settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let http_timeout = match get(ENV_HTTP_TIMEOUT) {
            None => Some(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS)),
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_HTTP_TIMEOUT,
                        value: raw,
                    });
                }
            },
        };

        Ok(Self {
            langs_dir: get(ENV_LANGS_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(default_langs_dir),
            temp_dir: owned_temp_dir(
                get(ENV_TEMP_DIR)
                    .map(PathBuf::from)
                    .unwrap_or_else(std::env::temp_dir),
            ),
            language: get(ENV_LANGUAGE).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            api_base: get(ENV_API_BASE).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: get(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            http_timeout,
            api_token: get(ENV_API_TOKEN),
        })
    }

    /// Per-call client settings carrying `api_token`.
    pub fn client_config(&self, api_token: &str) -> ClientConfig {
        ClientConfig::new(api_token.trim())
            .with_base_url(&self.api_base)
            .with_model(&self.model)
    }
}

/// First existing of: `<exe dir>/langs`, `<data dir>/<app>/langs`, `./langs`.
fn default_langs_dir() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("langs")));
    let data_dir = dirs::data_dir().map(|d| d.join(APP_NAME).join("langs"));

    exe_dir
        .into_iter()
        .chain(data_dir)
        .find(|dir| dir.is_dir())
        .unwrap_or_else(|| PathBuf::from("langs"))
}

/// Per-process directory under `parent`; the whole tree is removed on exit.
fn owned_temp_dir(parent: PathBuf) -> PathBuf {
    parent.join(format!("{APP_NAME}-{}", std::process::id()))
}
