//! Audio output device.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use super::PlaybackError;

/// Something that can play one audio file at a time.
#[cfg_attr(test, mockall::automock)]
pub trait AudioOutput {
    /// Start playing `path` from the beginning, replacing anything loaded.
    fn play(&mut self, path: &Path) -> Result<(), PlaybackError>;

    /// Stop playback, keeping the device open.
    fn stop(&mut self);

    /// Whether audio is still playing.
    fn is_busy(&self) -> bool;

    /// Drop every handle on the loaded file.
    fn unload(&mut self);
}

/// Default output device through rodio.
pub struct RodioOutput {
    // Dropping the stream silences every sink created from its handle.
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
}

impl RodioOutput {
    /// Open the system's default output device.
    pub fn new() -> Result<Self, PlaybackError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| PlaybackError::Device(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
        })
    }
}

impl AudioOutput for RodioOutput {
    fn play(&mut self, path: &Path) -> Result<(), PlaybackError> {
        self.unload();

        let file = File::open(path)?;
        let source =
            Decoder::new(BufReader::new(file)).map_err(|e| PlaybackError::Decode(e.to_string()))?;
        let sink = Sink::try_new(&self.handle).map_err(|e| PlaybackError::Device(e.to_string()))?;
        sink.append(source);

        self.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = &self.sink {
            sink.stop();
        }
    }

    fn is_busy(&self) -> bool {
        self.sink.as_ref().is_some_and(|sink| !sink.empty())
    }

    fn unload(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}
