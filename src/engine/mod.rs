//! Application orchestrator.
//!
//! The [`Studio`] lives on the UI thread and coordinates the parameter
//! form, the localization store, the synthesis backend and the playback
//! workflow. Each generation runs on its own short-lived worker thread that
//! reports back through an [`AppEvent`] channel; the worker never touches
//! UI state directly.

mod activity;
mod events;
mod studio;
mod worker;

pub use activity::ActivityLog;
pub use events::{AppEvent, WorkerEvent};
pub use studio::{Flow, Studio};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, MockSynthesizer};
    use crate::cli::Command;
    use crate::config::AppConfig;
    use crate::playback::{MockAudioOutput, PlaybackState};
    use serde_json::json;
    use std::path::{Path, PathBuf};
    use std::sync::mpsc::{self, Receiver};
    use std::time::Duration;
    use tempfile::TempDir;

    type TestStudio = Studio<MockSynthesizer, MockAudioOutput>;

    fn test_config(temp_dir: &TempDir) -> AppConfig {
        AppConfig {
            langs_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("langs"),
            temp_dir: temp_dir.path().join("audio"),
            language: "en_US".to_string(),
            api_base: "http://127.0.0.1:1".to_string(),
            model: "minimax/speech-02-hd".to_string(),
            http_timeout: None,
            api_token: None,
        }
    }

    fn idle_output() -> MockAudioOutput {
        let mut output = MockAudioOutput::new();
        output.expect_play().returning(|_| Ok(()));
        output.expect_stop().return_const(());
        output.expect_unload().return_const(());
        output.expect_is_busy().return_const(false);
        output
    }

    /// A synthesizer that succeeds `times` times, writing `body` as the audio.
    fn working_synthesizer(times: usize, body: &'static [u8]) -> MockSynthesizer {
        let mut mock = MockSynthesizer::new();
        mock.expect_synthesize()
            .times(times)
            .returning(|_, _| Ok("https://replicate.delivery/out.mp3".to_string()));
        mock.expect_download().times(times).returning(move |_, dest| {
            std::fs::write(dest, body).unwrap();
            Ok(body.len() as u64)
        });
        mock
    }

    fn studio(
        temp_dir: &TempDir,
        synthesizer: MockSynthesizer,
    ) -> (TestStudio, Receiver<AppEvent>) {
        let (tx, rx) = mpsc::channel();
        let studio = Studio::new(test_config(temp_dir), synthesizer, idle_output(), tx, false);
        (studio, rx)
    }

    fn fill_form(studio: &mut TestStudio) {
        studio.set_api_key("r8_test");
        studio.set_text("Hello from the test suite");
    }

    /// Feed worker messages back to the studio until the request completes.
    fn wait_idle(studio: &mut TestStudio, rx: &Receiver<AppEvent>) {
        while studio.is_busy() {
            let event = rx
                .recv_timeout(Duration::from_secs(5))
                .expect("worker did not report back");
            studio.handle(event);
        }
    }

    fn files_in(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .map(|d| d.flatten().map(|e| e.path()).collect())
            .unwrap_or_default()
    }

    // ===========================================
    // Startup
    // ===========================================

    #[test]
    fn test_startup_fills_defaults_and_welcomes() {
        let temp_dir = TempDir::new().unwrap();
        let (studio, _rx) = studio(&temp_dir, MockSynthesizer::new());

        assert_eq!(studio.localization().current_code(), "en_US");
        assert_eq!(studio.form().string("voice_id"), "Wise Woman");
        assert_eq!(studio.form().string("emotion"), "Auto");
        assert!(studio.log().contains("Welcome!"));
        assert!(!studio.is_busy());
    }

    #[test]
    fn test_startup_prefills_token() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.api_token = Some("r8_env".to_string());
        let (tx, _rx) = mpsc::channel();

        let studio = Studio::new(config, MockSynthesizer::new(), idle_output(), tx, false);

        assert_eq!(studio.form().api_key, "r8_env");
    }

    #[test]
    fn test_log_entries_are_timestamped() {
        let temp_dir = TempDir::new().unwrap();
        let (studio, _rx) = studio(&temp_dir, MockSynthesizer::new());

        let entry = &studio.log().entries()[0];
        assert!(entry.starts_with('['));
        assert_eq!(&entry[9..11], "] ");
    }

    // ===========================================
    // Generation
    // ===========================================

    #[test]
    fn test_generate_without_token_fails_before_network() {
        let temp_dir = TempDir::new().unwrap();
        let (mut studio, _rx) = studio(&temp_dir, MockSynthesizer::new());
        studio.set_text("Hello");

        assert!(!studio.generate());

        assert!(!studio.is_busy());
        assert!(studio.log().contains("Please enter your Replicate API token"));
        assert!(files_in(&temp_dir.path().join("audio")).is_empty());
    }

    #[test]
    fn test_generate_with_empty_custom_voice_fails() {
        let temp_dir = TempDir::new().unwrap();
        let (mut studio, _rx) = studio(&temp_dir, MockSynthesizer::new());
        fill_form(&mut studio);
        studio.set_param("voice_id", "Custom voice ID...");

        assert!(!studio.generate());
        assert!(studio.log().contains("Please enter a custom voice ID"));
    }

    #[test]
    fn test_generate_sends_mapped_payload() {
        let temp_dir = TempDir::new().unwrap();
        let mut mock = MockSynthesizer::new();
        mock.expect_synthesize()
            .withf(|config, payload| {
                config.api_token == "r8_test"
                    && config.base_url == "http://127.0.0.1:1"
                    && payload.get("voice_id") == Some(&json!("Calm_Woman"))
                    && payload.get("emotion") == Some(&json!("happy"))
                    && payload.get("pitch") == Some(&json!(-2))
                    && payload.get("english_normalization") == Some(&json!(true))
            })
            .times(1)
            .returning(|_, _| Ok("https://replicate.delivery/out.mp3".to_string()));
        mock.expect_download().times(1).returning(|_, dest| {
            std::fs::write(dest, b"ID3").unwrap();
            Ok(3)
        });
        let (mut studio, rx) = studio(&temp_dir, mock);
        fill_form(&mut studio);
        studio.set_param("voice_id", "Calm Woman");
        studio.set_param("emotion", "Happy");
        studio.set_param("pitch", "-2");
        studio.set_param("eng_norm", "on");

        assert!(studio.generate());
        wait_idle(&mut studio, &rx);

        assert!(studio.log().contains("Using voice: Calm_Woman"));
        assert_eq!(studio.workflow().state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_generation_keeps_exactly_one_file() {
        let temp_dir = TempDir::new().unwrap();
        let audio_dir = temp_dir.path().join("audio");
        let (mut studio, rx) = studio(&temp_dir, working_synthesizer(2, b"ID3 audio"));
        fill_form(&mut studio);

        assert!(studio.generate());
        wait_idle(&mut studio, &rx);
        let first = files_in(&audio_dir);
        assert_eq!(first.len(), 1);
        assert!(studio.log().contains("Download complete"));

        assert!(studio.generate());
        wait_idle(&mut studio, &rx);
        let second = files_in(&audio_dir);
        assert_eq!(second.len(), 1);
        assert_ne!(first[0], second[0]);
        assert!(!first[0].exists());
        assert!(studio.log().contains("Removed previous temporary audio file"));
    }

    #[test]
    fn test_generate_while_busy_is_refused() {
        let temp_dir = TempDir::new().unwrap();
        let (mut studio, rx) = studio(&temp_dir, working_synthesizer(1, b"ID3"));
        fill_form(&mut studio);

        assert!(studio.generate());
        assert!(!studio.generate());
        assert!(studio.log().contains("already running"));

        // Edits are locked too.
        studio.set_param("speed", "1.5");
        assert_eq!(studio.form().number("speed"), 1.0);

        wait_idle(&mut studio, &rx);
        assert!(!studio.is_busy());
    }

    #[test]
    fn test_worker_failure_returns_to_idle() {
        let temp_dir = TempDir::new().unwrap();
        let mut mock = MockSynthesizer::new();
        mock.expect_synthesize()
            .times(1)
            .returning(|_, _| Err(BackendError::Unauthorized("401: Invalid token".to_string())));
        let (mut studio, rx) = studio(&temp_dir, mock);
        fill_form(&mut studio);

        assert!(studio.generate());
        wait_idle(&mut studio, &rx);

        assert!(studio.log().contains("An error occurred: Authentication failed"));
        assert_eq!(studio.workflow().state(), PlaybackState::Absent);
        assert!(files_in(&temp_dir.path().join("audio")).is_empty());
    }

    #[test]
    fn test_download_failure_leaves_no_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut mock = MockSynthesizer::new();
        mock.expect_synthesize()
            .returning(|_, _| Ok("https://replicate.delivery/out.mp3".to_string()));
        mock.expect_download().returning(|_, dest| {
            std::fs::write(dest, b"partial").unwrap();
            Err(BackendError::ConnectionFailed("reset by peer".to_string()))
        });
        let (mut studio, rx) = studio(&temp_dir, mock);
        fill_form(&mut studio);

        studio.generate();
        wait_idle(&mut studio, &rx);

        assert!(studio.log().contains("reset by peer"));
        assert!(files_in(&temp_dir.path().join("audio")).is_empty());
    }

    // ===========================================
    // Playback and saving
    // ===========================================

    #[test]
    fn test_play_without_audio() {
        let temp_dir = TempDir::new().unwrap();
        let (mut studio, _rx) = studio(&temp_dir, MockSynthesizer::new());

        studio.toggle_playback();

        assert!(studio.log().contains("No audio file available"));
    }

    #[test]
    fn test_play_then_natural_end() {
        let temp_dir = TempDir::new().unwrap();
        let (mut studio, rx) = studio(&temp_dir, working_synthesizer(1, b"ID3"));
        fill_form(&mut studio);
        studio.generate();
        wait_idle(&mut studio, &rx);

        studio.toggle_playback();
        assert_eq!(studio.workflow().state(), PlaybackState::Playing);

        // The idle output reports not busy, so the next tick ends playback.
        studio.tick();
        assert_eq!(studio.workflow().state(), PlaybackState::Stopped);
        assert!(studio.log().contains("Playback finished"));
    }

    #[test]
    fn test_save_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let (mut studio, rx) = studio(&temp_dir, working_synthesizer(1, b"ID3 some mp3 bytes"));
        fill_form(&mut studio);
        studio.generate();
        wait_idle(&mut studio, &rx);

        let dest = temp_dir.path().join("keep");
        studio.save(&dest);

        let saved = temp_dir.path().join("keep.mp3");
        assert_eq!(std::fs::read(&saved).unwrap(), b"ID3 some mp3 bytes");
        assert!(studio.log().contains("Audio saved to"));
    }

    #[test]
    fn test_save_failure_is_logged() {
        let temp_dir = TempDir::new().unwrap();
        let (mut studio, rx) = studio(&temp_dir, working_synthesizer(1, b"ID3"));
        fill_form(&mut studio);
        studio.generate();
        wait_idle(&mut studio, &rx);

        studio.save(Path::new("/nonexistent/dir/out.mp3"));

        assert!(studio.log().contains("Failed to save audio"));
        assert_eq!(studio.workflow().state(), PlaybackState::Stopped);
    }

    // ===========================================
    // Language switching
    // ===========================================

    #[test]
    fn test_switch_language_replaces_labels_and_choices() {
        let temp_dir = TempDir::new().unwrap();
        let (mut studio, _rx) = studio(&temp_dir, MockSynthesizer::new());
        studio.set_param("voice_id", "Deep Voice Man");
        let english = studio.render_form();
        assert!(english.contains("Voice [voice_id]: Deep Voice Man"));

        assert!(studio.switch_language("zh_CN"));

        let chinese = studio.render_form();
        assert!(chinese.contains("音色 [voice_id]: 低沉男声"));
        assert!(chinese.contains("语速 [speed]"));
        assert!(!chinese.contains("Speed"));
        assert!(studio.render_options("emotion").contains("* 自动"));
    }

    #[test]
    fn test_switch_to_unknown_language() {
        let temp_dir = TempDir::new().unwrap();
        let (mut studio, _rx) = studio(&temp_dir, MockSynthesizer::new());

        assert!(!studio.switch_language("tlh_KL"));
        assert_eq!(studio.localization().current_code(), "en_US");
    }

    #[test]
    fn test_custom_voice_survives_language_switch() {
        let temp_dir = TempDir::new().unwrap();
        let (mut studio, _rx) = studio(&temp_dir, MockSynthesizer::new());
        studio.set_custom_voice("moss_audio_123");

        studio.switch_language("简体中文");

        assert_eq!(studio.form().string("voice_id"), "自定义音色 ID……");
        assert_eq!(studio.form().string("custom_voice_id"), "moss_audio_123");
    }

    // ===========================================
    // Commands and shutdown
    // ===========================================

    #[test]
    fn test_execute_quit() {
        let temp_dir = TempDir::new().unwrap();
        let (mut studio, _rx) = studio(&temp_dir, MockSynthesizer::new());

        assert_eq!(studio.execute(Command::Show), Flow::Continue);
        assert_eq!(studio.execute(Command::Quit), Flow::Quit);
    }

    #[test]
    fn test_close_removes_temp_dir_without_generation() {
        let temp_dir = TempDir::new().unwrap();
        let audio_dir = temp_dir.path().join("audio");
        std::fs::create_dir_all(&audio_dir).unwrap();
        let (mut studio, _rx) = studio(&temp_dir, MockSynthesizer::new());

        studio.close();

        assert!(!audio_dir.exists());
    }

    #[test]
    fn test_quit_waits_for_worker() {
        let temp_dir = TempDir::new().unwrap();
        let (mut studio, rx) = studio(&temp_dir, working_synthesizer(1, b"ID3"));
        fill_form(&mut studio);
        studio.generate();

        assert_eq!(studio.execute(Command::Quit), Flow::Continue);

        let mut flow = Flow::Continue;
        while studio.is_busy() {
            let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            flow = studio.handle(event);
        }
        assert_eq!(flow, Flow::Quit);
        assert_eq!(studio.workflow().state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_close_keeps_files_next_to_temp_dir() {
        let parent = TempDir::new().unwrap();
        let song = parent.path().join("my_song.mp3");
        std::fs::write(&song, b"keep me").unwrap();
        let parent_dir = parent.path().to_string_lossy().into_owned();
        let langs_dir = format!("{}/langs", env!("CARGO_MANIFEST_DIR"));
        let config = AppConfig::from_lookup(|key| match key {
            "MINIMAX_SPEECH_TEMP_DIR" => Some(parent_dir.clone()),
            "MINIMAX_SPEECH_LANGS_DIR" => Some(langs_dir.clone()),
            _ => None,
        })
        .unwrap();
        let audio_dir = config.temp_dir.clone();
        let (tx, rx) = mpsc::channel();
        let mut studio = Studio::new(config, working_synthesizer(1, b"ID3"), idle_output(), tx, false);
        fill_form(&mut studio);
        studio.generate();
        wait_idle(&mut studio, &rx);
        assert_eq!(files_in(&audio_dir).len(), 1);

        studio.close();

        assert!(!audio_dir.exists());
        assert_eq!(std::fs::read(&song).unwrap(), b"keep me");
    }

    #[test]
    fn test_run_processes_input_and_waits_for_worker() {
        let temp_dir = TempDir::new().unwrap();
        let audio_dir = temp_dir.path().join("audio");
        let (tx, rx) = mpsc::channel();
        let mut studio = Studio::new(
            test_config(&temp_dir),
            working_synthesizer(1, b"ID3"),
            idle_output(),
            tx.clone(),
            false,
        );

        for line in ["key r8_test", "set speed 1.5", "text Hello there", "generate"] {
            tx.send(AppEvent::Input(line.to_string())).unwrap();
        }
        tx.send(AppEvent::InputClosed).unwrap();

        studio.run(&rx);

        assert_eq!(studio.form().number("speed"), 1.5);
        assert!(studio.log().contains("Download complete"));
        assert!(studio.log().contains("Closing"));
        assert!(!audio_dir.exists());
    }
}
