//! The UI-thread state and its reactions to user commands and worker events.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use super::activity::ActivityLog;
use super::events::{AppEvent, WorkerEvent};
use super::worker::{self, Job};
use crate::backend::Synthesizer;
use crate::cli::{Command, parse_line};
use crate::config::AppConfig;
use crate::i18n::{Localization, label_key};
use crate::params::{
    FormError, FormState, MAX_TEXT_CHARS, PARAMETERS, ParamKind, collect, custom_text_id,
    descriptor,
};
use crate::playback::{AudioOutput, PlaybackError, PlaybackState, Toggle, Workflow};

/// How often the event loop checks whether playback has ended.
const TICK: Duration = Duration::from_millis(100);

const DEFAULT_SAVE_NAME: &str = "generated_speech.mp3";

/// Whether the event loop should keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Owns every piece of mutable application state. Lives on the UI thread.
pub struct Studio<S: Synthesizer + 'static, O: AudioOutput> {
    config: AppConfig,
    synthesizer: Arc<S>,
    localization: Localization,
    form: FormState,
    workflow: Workflow<O>,
    log: ActivityLog,
    events: Sender<AppEvent>,
    busy: bool,
    /// Quit once the in-flight request finishes.
    quit_pending: bool,
}

impl<S: Synthesizer + 'static, O: AudioOutput> Studio<S, O> {
    /// Create the studio. Worker threads report back through `events`.
    pub fn new(
        config: AppConfig,
        synthesizer: S,
        output: O,
        events: Sender<AppEvent>,
        echo: bool,
    ) -> Self {
        let localization = Localization::discover(&config.langs_dir, &config.language);
        let mut form = FormState::new();
        form.apply_language(None, &localization.table());
        if let Some(token) = &config.api_token {
            form.api_key = token.clone();
        }
        let workflow = Workflow::new(output, &config.temp_dir);

        let mut studio = Self {
            config,
            synthesizer: Arc::new(synthesizer),
            localization,
            form,
            workflow,
            log: ActivityLog::new(echo),
            events,
            busy: false,
            quit_pending: false,
        };
        let welcome = studio.t("welcome_log").to_string();
        studio.log.push(welcome);
        studio
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn workflow(&self) -> &Workflow<O> {
        &self.workflow
    }

    pub fn localization(&self) -> &Localization {
        &self.localization
    }

    /// Whether a synthesis request is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    fn t(&self, key: &str) -> &str {
        self.localization.get(key)
    }

    fn say(&mut self, key: &str) {
        let message = self.t(key).to_string();
        self.log.push(message);
    }

    fn say_with(&mut self, key: &str, detail: impl std::fmt::Display) {
        let message = format!("{}: {detail}", self.t(key));
        self.log.push(message);
    }

    /// Inputs are locked while a request is in flight.
    fn ensure_idle(&mut self) -> bool {
        if self.busy {
            self.say("error_busy");
        }
        !self.busy
    }

    // ===========================================
    // Event loop
    // ===========================================

    /// Process events until the user quits or input ends, then clean up.
    pub fn run(&mut self, events: &Receiver<AppEvent>) {
        self.log.show(&self.render_form());

        loop {
            let flow = match events.recv_timeout(TICK) {
                Ok(event) => self.handle(event),
                Err(RecvTimeoutError::Timeout) => {
                    self.tick();
                    Flow::Continue
                }
                Err(RecvTimeoutError::Disconnected) => Flow::Quit,
            };
            if flow == Flow::Quit {
                break;
            }
        }

        self.close();
    }

    /// React to one event.
    pub fn handle(&mut self, event: AppEvent) -> Flow {
        match event {
            AppEvent::Input(line) => match parse_line(&line) {
                Ok(Some(command)) => self.execute(command),
                Ok(None) => Flow::Continue,
                Err(usage) => {
                    self.log.show(usage.trim_end());
                    Flow::Continue
                }
            },
            AppEvent::InputClosed => self.request_quit(),
            AppEvent::Worker(event) => {
                self.on_worker_event(event);
                if self.quit_pending && !self.busy {
                    Flow::Quit
                } else {
                    Flow::Continue
                }
            }
        }
    }

    /// Quit now, or once the in-flight request has finished.
    fn request_quit(&mut self) -> Flow {
        self.quit_pending = true;
        if self.busy { Flow::Continue } else { Flow::Quit }
    }

    /// Run one shell command.
    pub fn execute(&mut self, command: Command) -> Flow {
        match command {
            Command::Key { token } => self.set_api_key(&token),
            Command::Text { words } => self.set_text(&words.join(" ")),
            Command::TextFile { path } => self.load_text(&path),
            Command::Set { param, value } => self.set_param(&param, &value.join(" ")),
            Command::Custom { voice_id } => self.set_custom_voice(&voice_id),
            Command::Options { param } => {
                let listing = self.render_options(&param);
                self.log.show(&listing);
            }
            Command::Show => self.log.show(&self.render_form()),
            Command::Lang { name } if name.is_empty() => {
                let listing = self.render_languages();
                self.log.show(&listing);
            }
            Command::Lang { name } => {
                if self.switch_language(&name.join(" ")) {
                    self.log.show(&self.render_form());
                }
            }
            Command::Generate => {
                self.generate();
            }
            Command::Play => self.toggle_playback(),
            Command::Stop => self.stop_playback(),
            Command::Save { path } => {
                let dest = path.unwrap_or_else(|| PathBuf::from(DEFAULT_SAVE_NAME));
                self.save(&dest);
            }
            Command::Quit => return self.request_quit(),
        }
        Flow::Continue
    }

    /// Periodic housekeeping: notice playback that finished on its own.
    pub fn tick(&mut self) {
        if self.workflow.poll() {
            self.say("log_playback_finished");
        }
    }

    // ===========================================
    // Form editing
    // ===========================================

    pub fn set_api_key(&mut self, token: &str) {
        if self.ensure_idle() {
            self.form.api_key = token.trim().to_string();
            let label = self.t("api_key_label").trim_end_matches([':', '：']).to_string();
            self.say_with("log_value_set", label);
        }
    }

    pub fn set_text(&mut self, text: &str) {
        if self.ensure_idle() {
            self.form.text = text.to_string();
            let count = self.form.text.chars().count();
            self.say_with("log_value_set", format!("{count}/{MAX_TEXT_CHARS}"));
        }
    }

    fn load_text(&mut self, path: &Path) {
        match std::fs::read_to_string(path) {
            Ok(text) => self.set_text(text.trim_end_matches(['\r', '\n'])),
            Err(e) => self.say_with("error_generic", format!("{}: {e}", path.display())),
        }
    }

    pub fn set_param(&mut self, id: &str, raw: &str) {
        if !self.ensure_idle() {
            return;
        }
        let table = self.localization.table();
        match self.form.set(id, raw, &table) {
            Ok(value) => {
                let message = format!(
                    "{}: {} = {value}",
                    table.get("log_value_set"),
                    table.get(&label_key(id))
                );
                self.log.push(message);
            }
            Err(e) => self.report_form_error(&e),
        }
    }

    pub fn set_custom_voice(&mut self, voice_id: &str) {
        if !self.ensure_idle() {
            return;
        }
        let table = self.localization.table();
        match self.form.set_custom("voice_id", voice_id, &table) {
            Ok(()) => {
                let message = format!(
                    "{}: {} = {}",
                    table.get("log_value_set"),
                    table.get(&label_key("custom_voice_id")),
                    voice_id.trim()
                );
                self.log.push(message);
            }
            Err(e) => self.report_form_error(&e),
        }
    }

    fn report_form_error(&mut self, error: &FormError) {
        match error {
            FormError::UnknownParam(id) => self.say_with("error_unknown_param", id),
            FormError::UnknownOption { value, .. } => self.say_with("error_unknown_option", value),
            other => self.say_with("error_invalid_value", other),
        }
    }

    /// Switch the interface language by display name or code.
    ///
    /// Returns whether the language changed.
    pub fn switch_language(&mut self, query: &str) -> bool {
        if !self.ensure_idle() {
            return false;
        }
        let Some(display) = self.localization.find_language(query).map(str::to_string) else {
            self.say_with("error_unknown_option", query);
            return false;
        };

        let previous = self.localization.table();
        if let Err(e) = self.localization.set_language(&display) {
            log::warn!("{e}");
            self.log.push(e.to_string());
        }
        let table = self.localization.table();
        self.form.apply_language(Some(previous.as_ref()), &table);

        self.say_with("log_language_changed", display);
        true
    }

    // ===========================================
    // Generation
    // ===========================================

    /// Validate the form and start a worker thread for it.
    ///
    /// Returns whether a worker was started.
    pub fn generate(&mut self) -> bool {
        if !self.ensure_idle() {
            return false;
        }

        match self.workflow.discard() {
            Ok(true) => self.say("log_cleaned_temp"),
            Ok(false) => {}
            Err(e) => self.say_with("log_clean_failed", e),
        }
        self.say("log_task_start");

        let table = self.localization.table();
        self.say("log_collecting_params");
        let payload = match collect(&self.form, &table) {
            Ok(payload) => payload,
            Err(e) => {
                self.say_with("error_generic", e.localized(&table));
                return false;
            }
        };

        if let Some(voice) = payload.get("voice_id").and_then(|v| v.as_str()) {
            self.say_with("log_using_voice", voice);
        }
        if let Some(boost) = payload.get("language_boost").and_then(|v| v.as_str())
            && boost != "None"
        {
            self.say_with("log_language_boost", boost);
        }

        let dest = match self.workflow.allocate() {
            Ok(dest) => dest,
            Err(e) => {
                self.say_with("error_generic", e);
                return false;
            }
        };

        let job = Job {
            config: self.config.client_config(&self.form.api_key),
            payload,
            dest,
            table,
        };
        match worker::spawn(Arc::clone(&self.synthesizer), job, self.events.clone()) {
            Ok(_) => {
                self.busy = true;
                true
            }
            Err(e) => {
                self.say_with("error_generic", e);
                false
            }
        }
    }

    /// Apply a message posted by the worker thread.
    pub fn on_worker_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Log(message) => self.log.push(message),
            WorkerEvent::Finished(Ok(result)) => {
                self.busy = false;
                self.workflow.adopt(result);
                self.say("log_download_complete");
            }
            WorkerEvent::Finished(Err(message)) => {
                self.busy = false;
                self.say_with("error_generic", message);
            }
        }
    }

    // ===========================================
    // Playback and saving
    // ===========================================

    pub fn toggle_playback(&mut self) {
        match self.workflow.toggle() {
            Ok(Toggle::Started) => self.say("log_playing"),
            Ok(Toggle::Stopped) => self.say("log_playback_stopped"),
            Err(PlaybackError::NoAudio) => self.say("error_no_audio_file"),
            Err(e) => self.say_with("error_playback_failed", e),
        }
    }

    pub fn stop_playback(&mut self) {
        if self.workflow.stop() {
            self.say("log_playback_stopped");
        }
    }

    /// Copy the generated audio to `dest`, adding `.mp3` when no extension is given.
    pub fn save(&mut self, dest: &Path) {
        let dest = if dest.extension().is_none() {
            dest.with_extension("mp3")
        } else {
            dest.to_path_buf()
        };

        match self.workflow.save(&dest) {
            Ok(_) => self.say_with("log_save_success", dest.display()),
            Err(PlaybackError::NoAudio) => self.say("error_no_audio_file"),
            Err(e) => self.say_with("log_save_failed", e),
        }
    }

    /// Stop audio and remove the temp directory.
    pub fn close(&mut self) {
        self.say("log_closing");
        self.workflow.close();
    }

    // ===========================================
    // Rendering
    // ===========================================

    /// Every label and value, in the active language.
    pub fn render_form(&self) -> String {
        let mut out = Vec::new();

        out.push(format!("== {} ==", self.t("window_title")));
        out.push(format!("{} {}", self.t("language_label"), self.localization.display_name()));

        let key_state = if self.form.api_key.is_empty() {
            format!("({})", self.t("api_key_placeholder"))
        } else {
            "********".to_string()
        };
        out.push(format!("{} {key_state}", self.t("api_key_label")));

        out.push(self.t("text_input_label").to_string());
        if self.form.text.trim().is_empty() {
            out.push(format!("  ({})", self.t("text_input_placeholder")));
        } else {
            out.push(format!(
                "  {} [{}/{MAX_TEXT_CHARS}]",
                preview(&self.form.text, 60),
                self.form.text.chars().count()
            ));
        }

        let table = self.localization.table();
        for desc in &PARAMETERS {
            let label = self.t(&label_key(desc.id)).to_string();
            match desc.kind {
                ParamKind::Separator => out.push(format!("-- {label} --")),
                ParamKind::CustomText { parent } => {
                    if table.custom_sentinel() == Some(self.form.string(parent)) {
                        let value = self.form.string(desc.id);
                        let shown = if value.is_empty() {
                            format!("({})", self.t("custom_voice_id_placeholder"))
                        } else {
                            value.to_string()
                        };
                        out.push(format!("  {label} [{}]: {shown}", desc.id));
                    }
                }
                _ => {
                    let value = self
                        .form
                        .value(desc.id)
                        .map(ToString::to_string)
                        .unwrap_or_default();
                    out.push(format!("  {label} [{}]: {value}", desc.id));
                }
            }
        }

        let generate = if self.busy {
            self.t("generating_button")
        } else {
            self.t("generate_button")
        };
        let play = match self.workflow.state() {
            PlaybackState::Playing => self.t("stop_button"),
            _ => self.t("play_button"),
        };
        let audio = if self.workflow.current().is_some() {
            "+"
        } else {
            "-"
        };
        out.push(format!("[{generate}] [{play} {audio}] [{} {audio}]", self.t("save_button")));

        out.join("\n")
    }

    /// Choices of one option parameter, marking the selected one.
    pub fn render_options(&self, id: &str) -> String {
        let Some(desc) = descriptor(id) else {
            return format!("{}: {id}", self.t("error_unknown_param"));
        };
        let table = self.localization.table();
        let selected = self.form.string(desc.id);
        let mut lines = vec![format!("{}:", self.t(&label_key(desc.id)))];

        for choice in FormState::choices(desc, &table) {
            let marker = if choice == selected { '*' } else { ' ' };
            lines.push(format!(" {marker} {choice}"));
        }
        if let ParamKind::Slider {
            min, max, steps, ..
        } = desc.kind
        {
            lines.push(format!("   {min} .. {max} ({steps} steps): {}", self.form.number(id)));
        }
        if custom_text_id(desc.id).is_some() && table.custom_sentinel().is_some() {
            lines.push(format!("   custom <id>: {}", self.t("custom_voice_id_placeholder")));
        }
        lines.join("\n")
    }

    pub fn render_languages(&self) -> String {
        let current = self.localization.display_name();
        self.localization
            .available_languages()
            .into_iter()
            .map(|name| {
                let marker = if name == current { '*' } else { ' ' };
                format!(" {marker} {name}")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// First `max` characters of `text` on one line.
fn preview(text: &str, max: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    if flat.chars().count() <= max {
        return flat;
    }
    let mut cut: String = flat.chars().take(max).collect();
    cut.push('…');
    cut
}
