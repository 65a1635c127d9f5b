//! The per-generation background thread.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use super::events::{AppEvent, WorkerEvent};
use crate::backend::{BackendError, ClientConfig, SynthesisResult, Synthesizer};
use crate::i18n::LocaleTable;
use crate::params::RequestPayload;

/// Everything one synthesis run needs, moved into the worker thread.
pub struct Job {
    pub config: ClientConfig,
    pub payload: RequestPayload,
    pub dest: PathBuf,
    /// Labels of the language active when the job started.
    pub table: Arc<LocaleTable>,
}

/// Run `job` on a new thread, reporting back through `events` only.
pub fn spawn<S: Synthesizer + 'static>(
    synthesizer: Arc<S>,
    job: Job,
    events: Sender<AppEvent>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("synthesis".to_string())
        .spawn(move || {
            let result = run(synthesizer.as_ref(), &job, &events).map_err(|e| {
                log::error!("Synthesis failed: {e}");
                if job.dest.exists() {
                    let _ = std::fs::remove_file(&job.dest);
                }
                e.to_string()
            });
            // The UI may already be gone; nothing left to report to.
            let _ = events.send(WorkerEvent::Finished(result).into());
        })
}

fn run<S: Synthesizer + ?Sized>(
    synthesizer: &S,
    job: &Job,
    events: &Sender<AppEvent>,
) -> Result<SynthesisResult, BackendError> {
    let post = |key: &str| {
        let _ = events.send(WorkerEvent::Log(job.table.get(key).to_string()).into());
    };

    post("log_calling_api");
    let source_url = synthesizer.synthesize(&job.config, &job.payload)?;
    post("log_api_success");

    let bytes = synthesizer.download(&source_url, &job.dest)?;
    log::debug!("Downloaded {bytes} bytes from {source_url}");

    Ok(SynthesisResult {
        source_url,
        path: job.dest.clone(),
    })
}
