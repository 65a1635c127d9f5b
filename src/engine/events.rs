//! Messages delivered to the UI thread's event loop.

use crate::backend::SynthesisResult;

/// Everything the UI thread reacts to arrives as one of these.
#[derive(Debug)]
pub enum AppEvent {
    /// A line typed by the user.
    Input(String),
    /// The input stream ended.
    InputClosed,
    /// A message from the synthesis worker.
    Worker(WorkerEvent),
}

/// Progress reported by the synthesis worker thread.
#[derive(Debug)]
pub enum WorkerEvent {
    /// A line for the activity log.
    Log(String),
    /// The worker is done; the error carries the underlying message.
    Finished(Result<SynthesisResult, String>),
}

impl From<WorkerEvent> for AppEvent {
    fn from(event: WorkerEvent) -> Self {
        AppEvent::Worker(event)
    }
}
