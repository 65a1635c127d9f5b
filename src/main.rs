//! minimax-speech-rs entry point.

use std::io::BufRead;
use std::sync::mpsc::{self, Sender};
use std::thread;

use anyhow::{Context, Result};
use minimax_speech_rs::backend::ReplicateClient;
use minimax_speech_rs::config::AppConfig;
use minimax_speech_rs::engine::{AppEvent, Studio};
use minimax_speech_rs::playback::RodioOutput;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    log::debug!(
        "Using model {} at {}, language files in {}",
        config.model,
        config.api_base,
        config.langs_dir.display()
    );

    let client =
        ReplicateClient::new(config.http_timeout).context("Failed to create HTTP client")?;
    let output = RodioOutput::new().context("Failed to open the audio output device")?;

    let (tx, rx) = mpsc::channel();
    spawn_stdin_reader(tx.clone()).context("Failed to start the input reader")?;

    let mut studio = Studio::new(config, client, output, tx, true);
    studio.run(&rx);

    Ok(())
}

/// Forward stdin lines to the event loop, then signal end of input.
fn spawn_stdin_reader(events: Sender<AppEvent>) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if events.send(AppEvent::Input(line)).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        log::warn!("Failed to read input: {e}");
                        break;
                    }
                }
            }
            let _ = events.send(AppEvent::InputClosed);
        })
}
