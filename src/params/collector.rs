//! Turns the form into the inference API's request payload.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::form::{FormState, custom_text_id};
use super::schema::{Choices, PARAMETERS, ParamKind, ParameterDescriptor};
use crate::i18n::LocaleTable;

/// Longest text the API accepts, in characters.
pub const MAX_TEXT_CHARS: usize = 5000;

/// Validation failures, reported before any network activity.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollectError {
    #[error("API token is missing")]
    MissingCredential,

    #[error("Text is missing")]
    MissingText,

    #[error("Text is too long ({len}/{MAX_TEXT_CHARS})")]
    TextTooLong { len: usize },

    #[error("A custom value is required for {param}")]
    CustomValueRequired { param: &'static str },

    #[error("'{value}' is not a valid choice for {param}")]
    UnknownOption { param: &'static str, value: String },
}

impl CollectError {
    /// Message shown to the user in the active language.
    pub fn localized(&self, table: &LocaleTable) -> String {
        let label = match self {
            CollectError::MissingCredential => table.get("error_no_api_key"),
            CollectError::MissingText => table.get("error_no_text"),
            CollectError::TextTooLong { .. } => table.get("error_text_too_long"),
            CollectError::CustomValueRequired { .. } => table.get("error_custom_voice_id_empty"),
            CollectError::UnknownOption { .. } => table.get("error_unknown_option"),
        };
        if label.is_empty() {
            return self.to_string();
        }
        match self {
            CollectError::TextTooLong { len } => format!("{label} ({len}/{MAX_TEXT_CHARS})!"),
            CollectError::UnknownOption { param, value } => format!("{label}: {param} = {value}"),
            _ => label.to_string(),
        }
    }
}

/// Request body fields, keyed by API field name, in parameter order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RequestPayload(Map<String, Value>);

impl RequestPayload {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Validate the form and build the request payload.
///
/// Stops at the first failure. Reads nothing but its arguments.
pub fn collect(form: &FormState, table: &LocaleTable) -> Result<RequestPayload, CollectError> {
    if form.api_key.trim().is_empty() {
        return Err(CollectError::MissingCredential);
    }

    let text = form.text.as_str();
    let placeholder = table.get("text_input_placeholder");
    if text.trim().is_empty() || (!placeholder.is_empty() && text.trim() == placeholder) {
        return Err(CollectError::MissingText);
    }

    let len = text.chars().count();
    if len > MAX_TEXT_CHARS {
        return Err(CollectError::TextTooLong { len });
    }

    let mut payload = RequestPayload::default();
    payload.insert("text", text);

    for desc in &PARAMETERS {
        if let (Some(field), Some(value)) = (desc.field_name(), field_value(desc, form, table)?) {
            payload.insert(field, value);
        }
    }

    Ok(payload)
}

fn field_value(
    desc: &ParameterDescriptor,
    form: &FormState,
    table: &LocaleTable,
) -> Result<Option<Value>, CollectError> {
    let value = match desc.kind {
        ParamKind::Slider { integer: true, .. } => Value::from(form.number(desc.id).trunc() as i64),
        ParamKind::Slider { .. } => Value::from(form.number(desc.id)),
        ParamKind::Checkbox { .. } => Value::from(form.flag(desc.id)),
        ParamKind::OptionList {
            choices: Choices::Localized { map_key, custom },
            ..
        } => {
            let display = form.string(desc.id);
            let is_custom = custom && table.custom_sentinel() == Some(display);
            if is_custom {
                let custom_value = custom_text_id(desc.id)
                    .map(|id| form.string(id).trim())
                    .unwrap_or_default();
                if custom_value.is_empty() {
                    return Err(CollectError::CustomValueRequired { param: desc.id });
                }
                Value::from(custom_value)
            } else {
                let code = table.options(map_key).code_for(display).ok_or_else(|| {
                    CollectError::UnknownOption {
                        param: desc.id,
                        value: display.to_string(),
                    }
                })?;
                Value::from(code)
            }
        }
        ParamKind::OptionList {
            choices: Choices::Fixed(_),
            ..
        } => {
            let raw = form.string(desc.id);
            match raw.parse::<i64>() {
                Ok(n) if raw.bytes().all(|b| b.is_ascii_digit()) => Value::from(n),
                _ => Value::from(raw),
            }
        }
        ParamKind::CustomText { .. } | ParamKind::Separator => return Ok(None),
    };
    Ok(Some(value))
}
