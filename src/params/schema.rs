//! The fixed, ordered table of synthesis parameters.

/// Where an option list gets its choices from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Choices {
    /// A fixed list; the selected string is sent as-is (numeric strings as integers).
    Fixed(&'static [&'static str]),
    /// A display-name to API-code map looked up in the active language file.
    Localized {
        map_key: &'static str,
        /// Whether the language's custom sentinel is offered as an extra choice.
        custom: bool,
    },
}

/// Widget kind of a parameter, with everything needed to validate its value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    Slider {
        min: f64,
        max: f64,
        steps: u32,
        default: f64,
        /// Sent to the API as an integer.
        integer: bool,
    },
    Checkbox {
        default: bool,
    },
    OptionList {
        choices: Choices,
        /// `None` means "first choice of the active language".
        default: Option<&'static str>,
    },
    /// Free text used in place of `parent`'s value when its custom sentinel is selected.
    CustomText {
        parent: &'static str,
    },
    Separator,
}

impl ParamKind {
    /// Distance between two adjacent slider positions.
    pub fn step(&self) -> Option<f64> {
        match *self {
            ParamKind::Slider {
                min, max, steps, ..
            } if steps > 0 => Some((max - min) / f64::from(steps)),
            _ => None,
        }
    }
}

/// Static definition of one configurable synthesis parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterDescriptor {
    pub id: &'static str,
    pub kind: ParamKind,
    /// API field name when it differs from `id`.
    pub api_field: Option<&'static str>,
}

impl ParameterDescriptor {
    const fn new(id: &'static str, kind: ParamKind) -> Self {
        Self {
            id,
            kind,
            api_field: None,
        }
    }

    const fn sent_as(mut self, api_field: &'static str) -> Self {
        self.api_field = Some(api_field);
        self
    }

    /// Name of the request field this parameter fills, if it fills one directly.
    pub fn field_name(&self) -> Option<&'static str> {
        match self.kind {
            ParamKind::CustomText { .. } | ParamKind::Separator => None,
            _ => Some(self.api_field.unwrap_or(self.id)),
        }
    }
}

pub const BITRATES: &[&str] = &["32000", "64000", "128000", "256000"];
pub const SAMPLE_RATES: &[&str] = &["8000", "16000", "22050", "24000", "32000", "44100"];

/// Every parameter in display order.
pub static PARAMETERS: [ParameterDescriptor; 12] = [
    ParameterDescriptor::new(
        "voice_id",
        ParamKind::OptionList {
            choices: Choices::Localized {
                map_key: "voice_map",
                custom: true,
            },
            default: None,
        },
    ),
    ParameterDescriptor::new("custom_voice_id", ParamKind::CustomText { parent: "voice_id" }),
    ParameterDescriptor::new(
        "speed",
        ParamKind::Slider {
            min: 0.5,
            max: 2.0,
            steps: 30,
            default: 1.0,
            integer: false,
        },
    ),
    ParameterDescriptor::new(
        "volume",
        ParamKind::Slider {
            min: 0.0,
            max: 10.0,
            steps: 100,
            default: 1.0,
            integer: false,
        },
    ),
    ParameterDescriptor::new(
        "pitch",
        ParamKind::Slider {
            min: -12.0,
            max: 12.0,
            steps: 24,
            default: 0.0,
            integer: true,
        },
    ),
    ParameterDescriptor::new(
        "emotion",
        ParamKind::OptionList {
            choices: Choices::Localized {
                map_key: "emotion_map",
                custom: false,
            },
            default: None,
        },
    ),
    ParameterDescriptor::new("eng_norm", ParamKind::Checkbox { default: false })
        .sent_as("english_normalization"),
    ParameterDescriptor::new("advanced_sep", ParamKind::Separator),
    ParameterDescriptor::new(
        "bitrate",
        ParamKind::OptionList {
            choices: Choices::Fixed(BITRATES),
            default: Some("128000"),
        },
    ),
    ParameterDescriptor::new(
        "sample_rate",
        ParamKind::OptionList {
            choices: Choices::Fixed(SAMPLE_RATES),
            default: Some("32000"),
        },
    ),
    ParameterDescriptor::new(
        "channel",
        ParamKind::OptionList {
            choices: Choices::Localized {
                map_key: "channel_map",
                custom: false,
            },
            default: None,
        },
    ),
    ParameterDescriptor::new(
        "lang_boost",
        ParamKind::OptionList {
            choices: Choices::Localized {
                map_key: "language_boost_map",
                custom: false,
            },
            default: None,
        },
    )
    .sent_as("language_boost"),
];

/// Look up a descriptor by id.
pub fn descriptor(id: &str) -> Option<&'static ParameterDescriptor> {
    PARAMETERS.iter().find(|d| d.id == id)
}
