//! Playback and save workflow for the generated audio.
//!
//! The workflow owns one temporary directory holding at most one audio
//! file. A new generation discards the old file before a new one is
//! downloaded; closing deletes the directory tree.

mod output;
mod workflow;

pub use output::{AudioOutput, RodioOutput};
pub use workflow::{PlaybackState, Toggle, Workflow};

#[cfg(test)]
pub use output::MockAudioOutput;

use thiserror::Error;

/// Errors that can occur while playing or saving audio.
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("No audio file available")]
    NoAudio,

    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Could not decode audio: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
