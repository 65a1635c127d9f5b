//! Language file discovery and the active translation table.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

/// Language code loaded when nothing else is requested or found.
pub const DEFAULT_LANGUAGE: &str = "en_US";

const DISPLAY_NAME_KEY: &str = "language_display_name";

/// Errors that can occur while loading a language file.
#[derive(Error, Debug)]
pub enum LocaleError {
    #[error("Language file not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid language file: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Every string of one language, keyed as in the language file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocaleTable {
    entries: Map<String, Value>,
}

impl LocaleTable {
    /// Parse a table from the contents of a language file.
    pub fn from_json(json: &str) -> Result<Self, LocaleError> {
        let entries: Map<String, Value> = serde_json::from_str(json)?;
        Ok(Self { entries })
    }

    /// Look up a label. Missing or non-string keys yield an empty string.
    pub fn get(&self, key: &str) -> &str {
        self.entries.get(key).and_then(Value::as_str).unwrap_or("")
    }

    /// Look up a nested display-name to API-code map.
    pub fn options(&self, key: &str) -> OptionMap<'_> {
        OptionMap {
            entries: self.entries.get(key).and_then(Value::as_object),
        }
    }

    /// The reserved choice meaning "the user types the API value".
    ///
    /// `None` when the language file does not define one.
    pub fn custom_sentinel(&self) -> Option<&str> {
        Some(self.get("voice_custom_option")).filter(|s| !s.is_empty())
    }
}

/// Ordered display-name to API-code pairs, in language file order.
#[derive(Debug, Clone, Copy)]
pub struct OptionMap<'a> {
    entries: Option<&'a Map<String, Value>>,
}

impl<'a> OptionMap<'a> {
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.entries
            .into_iter()
            .flat_map(|m| m.iter())
            .filter_map(|(k, v)| v.as_str().map(|code| (k.as_str(), code)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Display names in order.
    pub fn displays(&self) -> Vec<&'a str> {
        self.iter().map(|(display, _)| display).collect()
    }

    pub fn first(&self) -> Option<(&'a str, &'a str)> {
        self.iter().next()
    }

    pub fn code_for(&self, display: &str) -> Option<&'a str> {
        self.iter().find(|(d, _)| *d == display).map(|(_, c)| c)
    }

    pub fn display_for(&self, code: &str) -> Option<&'a str> {
        self.iter().find(|(_, c)| *c == code).map(|(d, _)| d)
    }
}

/// Discovers the language files in a directory and holds the active one.
pub struct Localization {
    dir: PathBuf,
    /// Display name -> language code.
    languages: BTreeMap<String, String>,
    current_code: String,
    current: Arc<LocaleTable>,
}

impl Localization {
    /// Scan `dir` for `*.json` language files and activate `default_code`.
    ///
    /// Never fails: unreadable files are skipped and a missing directory
    /// leaves only an empty English table.
    pub fn discover(dir: impl Into<PathBuf>, default_code: &str) -> Self {
        let dir = dir.into();
        let languages = discover_languages(&dir);

        let mut localization = Self {
            dir,
            languages,
            current_code: String::new(),
            current: Arc::new(LocaleTable::default()),
        };

        let default_display = localization
            .languages
            .iter()
            .find(|(_, code)| code.as_str() == default_code)
            .map(|(display, _)| display.clone())
            .unwrap_or_else(|| "English".to_string());

        if let Err(e) = localization.set_language(&default_display) {
            log::warn!("{e}");
        }

        localization
    }

    /// Display names of every discovered language, sorted.
    pub fn available_languages(&self) -> Vec<String> {
        self.languages.keys().cloned().collect()
    }

    /// Resolve a display name or language code, ignoring case.
    pub fn find_language(&self, query: &str) -> Option<&str> {
        let query = query.trim();
        self.languages
            .iter()
            .find(|(display, code)| {
                display.eq_ignore_ascii_case(query) || code.eq_ignore_ascii_case(query)
            })
            .map(|(display, _)| display.as_str())
    }

    /// Replace the active table with the one for `display_name`.
    ///
    /// Unknown names fall back to the default language. If the file cannot
    /// be loaded the active table becomes empty and the error is returned.
    pub fn set_language(&mut self, display_name: &str) -> Result<(), LocaleError> {
        let code = self
            .languages
            .get(display_name)
            .cloned()
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        let path = self.dir.join(format!("{code}.json"));
        self.current_code = code;

        match load_table(&path) {
            Ok(table) => {
                log::info!("Loaded language: {display_name}");
                self.current = Arc::new(table);
                Ok(())
            }
            Err(e) => {
                self.current = Arc::new(LocaleTable::default());
                Err(e)
            }
        }
    }

    /// Code of the active language, e.g. `en_US`.
    pub fn current_code(&self) -> &str {
        &self.current_code
    }

    /// Display name of the active language as written in its file.
    pub fn display_name(&self) -> &str {
        self.current.get(DISPLAY_NAME_KEY)
    }

    pub fn get(&self, key: &str) -> &str {
        self.current.get(key)
    }

    /// Shared handle to the active table, safe to send to other threads.
    pub fn table(&self) -> Arc<LocaleTable> {
        Arc::clone(&self.current)
    }
}

fn discover_languages(dir: &Path) -> BTreeMap<String, String> {
    let mut languages = BTreeMap::new();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::error!("Language directory {} unreadable: {e}", dir.display());
            languages.insert("English".to_string(), DEFAULT_LANGUAGE.to_string());
            return languages;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.extension().is_some_and(|ext| ext == "json") {
            continue;
        }
        let Some(code) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        match load_table(&path) {
            Ok(table) => {
                let display = Some(table.get(DISPLAY_NAME_KEY))
                    .filter(|s| !s.is_empty())
                    .unwrap_or(code);
                languages.insert(display.to_string(), code.to_string());
            }
            Err(e) => log::warn!("Skipping language file {}: {e}", path.display()),
        }
    }

    languages
}

fn load_table(path: &Path) -> Result<LocaleTable, LocaleError> {
    if !path.exists() {
        return Err(LocaleError::NotFound(path.to_path_buf()));
    }
    let json = std::fs::read_to_string(path)?;
    LocaleTable::from_json(&json)
}
