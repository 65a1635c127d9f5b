//! Lifecycle of the single temporary audio file.

use std::path::{Path, PathBuf};

use super::PlaybackError;
use super::output::AudioOutput;
use crate::backend::SynthesisResult;

/// Where the temporary audio file stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Absent,
    Stopped,
    Playing,
}

/// Outcome of [`Workflow::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Started,
    Stopped,
}

/// Owns the temp directory, the one audio file in it, and the output device.
pub struct Workflow<O: AudioOutput> {
    output: O,
    temp_dir: PathBuf,
    current: Option<SynthesisResult>,
    playing: bool,
    next_id: u64,
    closed: bool,
}

impl<O: AudioOutput> Workflow<O> {
    /// Create a workflow using `temp_dir`. The directory is created on first use.
    pub fn new(output: O, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            output,
            temp_dir: temp_dir.into(),
            current: None,
            playing: false,
            next_id: 0,
            closed: false,
        }
    }

    pub fn current(&self) -> Option<&SynthesisResult> {
        self.current.as_ref()
    }

    pub fn state(&self) -> PlaybackState {
        match (&self.current, self.playing) {
            (None, _) => PlaybackState::Absent,
            (Some(_), false) => PlaybackState::Stopped,
            (Some(_), true) => PlaybackState::Playing,
        }
    }

    /// Release the audio device's handle and delete the current file.
    ///
    /// Returns whether a file was removed. The workflow forgets the file
    /// even when deleting it fails.
    pub fn discard(&mut self) -> Result<bool, PlaybackError> {
        self.output.unload();
        self.playing = false;

        let Some(previous) = self.current.take() else {
            return Ok(false);
        };
        if !previous.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&previous.path)?;
        log::debug!("Removed {}", previous.path.display());
        Ok(true)
    }

    /// Reserve a fresh path in the temp directory for the next download.
    pub fn allocate(&mut self) -> Result<PathBuf, PlaybackError> {
        std::fs::create_dir_all(&self.temp_dir)?;
        loop {
            self.next_id += 1;
            let path = self.temp_dir.join(format!("speech-{}.mp3", self.next_id));
            if !path.exists() {
                return Ok(path);
            }
        }
    }

    /// Take ownership of a finished download.
    pub fn adopt(&mut self, result: SynthesisResult) {
        if self.current.as_ref().is_some_and(|c| c.path != result.path)
            && let Err(e) = self.discard()
        {
            log::warn!("Could not remove superseded audio file: {e}");
        }
        self.current = Some(result);
        self.playing = false;
    }

    /// Play when stopped, stop when playing.
    pub fn toggle(&mut self) -> Result<Toggle, PlaybackError> {
        let path = self.existing_path()?.to_path_buf();

        if self.playing && self.output.is_busy() {
            self.output.stop();
            self.output.unload();
            self.playing = false;
            return Ok(Toggle::Stopped);
        }

        self.output.play(&path)?;
        self.playing = true;
        Ok(Toggle::Started)
    }

    /// Stop playback. Returns whether anything was playing.
    pub fn stop(&mut self) -> bool {
        let was_playing = self.playing;
        self.output.stop();
        self.output.unload();
        self.playing = false;
        was_playing
    }

    /// Notice playback that ended on its own. Returns `true` once per natural end.
    pub fn poll(&mut self) -> bool {
        if self.playing && !self.output.is_busy() {
            self.playing = false;
            self.output.unload();
            return true;
        }
        false
    }

    /// Copy the current file to `dest`.
    pub fn save(&self, dest: &Path) -> Result<u64, PlaybackError> {
        let source = self.existing_path()?;
        Ok(std::fs::copy(source, dest)?)
    }

    /// Stop audio and delete the whole temp directory, ignoring errors.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.output.stop();
        self.output.unload();
        self.playing = false;
        self.current = None;

        if let Err(e) = std::fs::remove_dir_all(&self.temp_dir)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            log::warn!(
                "Could not remove temp directory {}: {e}",
                self.temp_dir.display()
            );
        }
    }

    fn existing_path(&self) -> Result<&Path, PlaybackError> {
        match &self.current {
            Some(result) if result.path.exists() => Ok(&result.path),
            _ => Err(PlaybackError::NoAudio),
        }
    }
}

impl<O: AudioOutput> Drop for Workflow<O> {
    fn drop(&mut self) {
        self.close();
    }
}
