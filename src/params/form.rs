//! Current value of every parameter, plus the credential and text fields.

use std::collections::BTreeMap;

use thiserror::Error;

use super::schema::{Choices, PARAMETERS, ParamKind, ParameterDescriptor, descriptor};
use crate::i18n::LocaleTable;

/// Errors raised when the user edits a parameter.
#[derive(Error, Debug, PartialEq)]
pub enum FormError {
    #[error("Unknown parameter: {0}")]
    UnknownParam(String),

    #[error("Parameter cannot be edited: {0}")]
    NotEditable(&'static str),

    #[error("Invalid value for {param}: {value}")]
    InvalidValue { param: &'static str, value: String },

    #[error("{param} must be between {min} and {max}, got {value}")]
    OutOfRange {
        param: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("'{value}' is not a valid choice for {param}")]
    UnknownOption { param: &'static str, value: String },

    #[error("The current language offers no custom choice for {0}")]
    NoCustomOption(&'static str),
}

/// Value held by one parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Number(f64),
    Flag(bool),
    Choice(String),
    Text(String),
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Number(n) => write!(f, "{n}"),
            ParamValue::Flag(b) => write!(f, "{b}"),
            ParamValue::Choice(s) | ParamValue::Text(s) => f.write_str(s),
        }
    }
}

/// Everything the user has entered so far.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub api_key: String,
    pub text: String,
    values: BTreeMap<&'static str, ParamValue>,
}

impl Default for FormState {
    fn default() -> Self {
        Self::new()
    }
}

impl FormState {
    /// A form holding every parameter's default.
    ///
    /// Localized option lists start unset; [`FormState::apply_language`]
    /// fills them from the active language.
    pub fn new() -> Self {
        let values = PARAMETERS
            .iter()
            .filter_map(|desc| {
                let value = match desc.kind {
                    ParamKind::Slider { default, .. } => ParamValue::Number(default),
                    ParamKind::Checkbox { default } => ParamValue::Flag(default),
                    ParamKind::OptionList { default, .. } => {
                        ParamValue::Choice(default.unwrap_or_default().to_string())
                    }
                    ParamKind::CustomText { .. } => ParamValue::Text(String::new()),
                    ParamKind::Separator => return None,
                };
                Some((desc.id, value))
            })
            .collect();

        Self {
            api_key: String::new(),
            text: String::new(),
            values,
        }
    }

    pub fn value(&self, id: &str) -> Option<&ParamValue> {
        self.values.get(id)
    }

    pub fn number(&self, id: &str) -> f64 {
        match self.values.get(id) {
            Some(ParamValue::Number(n)) => *n,
            _ => 0.0,
        }
    }

    pub fn flag(&self, id: &str) -> bool {
        matches!(self.values.get(id), Some(ParamValue::Flag(true)))
    }

    /// Selected choice or entered text; empty when unset.
    pub fn string(&self, id: &str) -> &str {
        match self.values.get(id) {
            Some(ParamValue::Choice(s) | ParamValue::Text(s)) => s,
            _ => "",
        }
    }

    /// Choices offered for an option list in the given language, in display order.
    ///
    /// The custom sentinel, when offered, comes last so the first choice is
    /// always a real option.
    pub fn choices(desc: &ParameterDescriptor, table: &LocaleTable) -> Vec<String> {
        match desc.kind {
            ParamKind::OptionList {
                choices: Choices::Fixed(options),
                ..
            } => options.iter().map(|s| s.to_string()).collect(),
            ParamKind::OptionList {
                choices: Choices::Localized { map_key, custom },
                ..
            } => {
                let mut displays: Vec<String> = table
                    .options(map_key)
                    .displays()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                if custom && let Some(sentinel) = table.custom_sentinel() {
                    displays.push(sentinel.to_string());
                }
                displays
            }
            _ => Vec::new(),
        }
    }

    /// Change one parameter from user input.
    pub fn set(
        &mut self,
        id: &str,
        raw: &str,
        table: &LocaleTable,
    ) -> Result<&ParamValue, FormError> {
        let desc = descriptor(id).ok_or_else(|| FormError::UnknownParam(id.to_string()))?;
        let raw = raw.trim();

        let value = match desc.kind {
            ParamKind::Slider { min, max, .. } => {
                let parsed: f64 = raw.parse().map_err(|_| FormError::InvalidValue {
                    param: desc.id,
                    value: raw.to_string(),
                })?;
                if !parsed.is_finite() || parsed < min || parsed > max {
                    return Err(FormError::OutOfRange {
                        param: desc.id,
                        value: parsed,
                        min,
                        max,
                    });
                }
                ParamValue::Number(snap(desc, parsed))
            }
            ParamKind::Checkbox { .. } => ParamValue::Flag(parse_flag(raw).ok_or_else(|| {
                FormError::InvalidValue {
                    param: desc.id,
                    value: raw.to_string(),
                }
            })?),
            ParamKind::OptionList {
                choices: Choices::Fixed(_),
                ..
            } => {
                // Fixed lists are editable combo boxes; any non-empty entry is accepted.
                if raw.is_empty() {
                    return Err(FormError::InvalidValue {
                        param: desc.id,
                        value: raw.to_string(),
                    });
                }
                ParamValue::Choice(raw.to_string())
            }
            ParamKind::OptionList {
                choices: Choices::Localized { map_key, custom },
                ..
            } => {
                let options = table.options(map_key);
                let sentinel = table.custom_sentinel().filter(|_| custom);
                let display = if options.code_for(raw).is_some() || sentinel == Some(raw) {
                    raw
                } else if let Some(display) = options.display_for(raw) {
                    display
                } else {
                    return Err(FormError::UnknownOption {
                        param: desc.id,
                        value: raw.to_string(),
                    });
                };
                if custom && sentinel != Some(display) {
                    self.clear_custom_text(desc.id);
                }
                ParamValue::Choice(display.to_string())
            }
            ParamKind::CustomText { .. } => ParamValue::Text(raw.to_string()),
            ParamKind::Separator => return Err(FormError::NotEditable(desc.id)),
        };

        self.values.insert(desc.id, value);
        Ok(&self.values[desc.id])
    }

    /// Select the custom sentinel of `parent` and store `value` as its custom text.
    pub fn set_custom(
        &mut self,
        parent: &str,
        value: &str,
        table: &LocaleTable,
    ) -> Result<(), FormError> {
        let desc = descriptor(parent).ok_or_else(|| FormError::UnknownParam(parent.to_string()))?;
        let sentinel = match desc.kind {
            ParamKind::OptionList {
                choices: Choices::Localized { custom: true, .. },
                ..
            } => table
                .custom_sentinel()
                .ok_or(FormError::NoCustomOption(desc.id))?,
            _ => return Err(FormError::NoCustomOption(desc.id)),
        };
        let text_id = custom_text_id(desc.id).ok_or(FormError::NoCustomOption(desc.id))?;

        self.values
            .insert(desc.id, ParamValue::Choice(sentinel.to_string()));
        self.values
            .insert(text_id, ParamValue::Text(value.trim().to_string()));
        Ok(())
    }

    /// Re-point localized option lists at a newly loaded language.
    ///
    /// A selection is carried over by its API code. The old custom sentinel
    /// becomes the new one. Anything that cannot be carried over, including
    /// an unset value, becomes the new language's first choice.
    pub fn apply_language(&mut self, previous: Option<&LocaleTable>, table: &LocaleTable) {
        for desc in &PARAMETERS {
            let ParamKind::OptionList {
                choices: Choices::Localized { map_key, custom },
                ..
            } = desc.kind
            else {
                continue;
            };

            let current = self.string(desc.id).to_string();
            let options = table.options(map_key);
            let new_sentinel = table.custom_sentinel().filter(|_| custom);
            let was_custom = custom
                && !current.is_empty()
                && previous
                    .and_then(LocaleTable::custom_sentinel)
                    .is_some_and(|old| old == current);

            let carried = if was_custom {
                new_sentinel.map(str::to_string)
            } else if options.code_for(&current).is_some() {
                Some(current.clone())
            } else {
                previous
                    .and_then(|old| old.options(map_key).code_for(&current))
                    .and_then(|code| options.display_for(code))
                    .map(str::to_string)
            };

            let next = carried
                .or_else(|| options.first().map(|(display, _)| display.to_string()))
                .unwrap_or_default();

            if custom && new_sentinel != Some(next.as_str()) {
                self.clear_custom_text(desc.id);
            }
            self.values.insert(desc.id, ParamValue::Choice(next));
        }
    }

    fn clear_custom_text(&mut self, parent: &str) {
        if let Some(text_id) = custom_text_id(parent) {
            self.values.insert(text_id, ParamValue::Text(String::new()));
        }
    }
}

/// Id of the custom-text parameter paired with `parent`.
pub fn custom_text_id(parent: &str) -> Option<&'static str> {
    PARAMETERS.iter().find_map(|d| match d.kind {
        ParamKind::CustomText { parent: p } if p == parent => Some(d.id),
        _ => None,
    })
}

/// Round a slider value to the nearest position on its step grid.
fn snap(desc: &ParameterDescriptor, value: f64) -> f64 {
    let (ParamKind::Slider { min, max, .. }, Some(step)) = (desc.kind, desc.kind.step()) else {
        return value;
    };
    let snapped = min + ((value - min) / step).round() * step;
    // Trim float noise such as 1.2000000000000002.
    ((snapped * 1e6).round() / 1e6).clamp(min, max)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}
