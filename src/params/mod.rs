//! Synthesis parameters: the descriptor table, the user's current values,
//! and the mapping of those values onto the inference API's request fields.

mod collector;
mod form;
mod schema;

pub use collector::{CollectError, MAX_TEXT_CHARS, RequestPayload, collect};
pub use form::{FormError, FormState, ParamValue, custom_text_id};
pub use schema::{BITRATES, Choices, PARAMETERS, ParamKind, ParameterDescriptor, SAMPLE_RATES, descriptor};
