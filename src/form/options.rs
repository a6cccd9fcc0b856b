use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use super::controller::{FormError, FormResult};

/// User-facing texts. Templates may contain `{limit}` or `{message}`.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormMessages {
    pub required: String,
    pub invalid_email: String,
    pub invalid_url: String,
    pub invalid_format: String,
    pub too_short: String,
    pub too_long: String,
    pub range_underflow: String,
    pub range_overflow: String,
    pub pattern_mismatch: String,
    pub invalid_field: String,
    pub submit_success: String,
    pub submit_failed: String,
    pub no_file_selected: String,
}

impl Default for FormMessages {
    fn default() -> Self {
        Self {
            required: "This field is required.".into(),
            invalid_email: "Enter a valid email.".into(),
            invalid_url: "Enter a valid URL.".into(),
            invalid_format: "Invalid format.".into(),
            too_short: "Minimum of {limit} characters.".into(),
            too_long: "Maximum of {limit} characters.".into(),
            range_underflow: "Minimum value: {limit}.".into(),
            range_overflow: "Maximum value: {limit}.".into(),
            pattern_mismatch: "Format not accepted.".into(),
            invalid_field: "Invalid field.".into(),
            submit_success: "Form submitted successfully!".into(),
            submit_failed: "Error: {message}".into(),
            no_file_selected: "No file selected...".into(),
        }
    }
}

impl FormMessages {
    pub fn submit_failed(&self, message: &str) -> String {
        self.submit_failed.replace("{message}", message)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FormOptions {
    pub validate_on_blur: bool,
    pub validate_on_input: bool,
    pub show_messages: bool,
    pub notice_duration: Duration,
    pub busy_label: String,
    pub messages: FormMessages,
    /// Options this crate does not recognize, kept untouched.
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            validate_on_blur: true,
            validate_on_input: true,
            show_messages: true,
            notice_duration: Duration::from_millis(3_000),
            busy_label: "Sending...".into(),
            messages: FormMessages::default(),
            extra: BTreeMap::new(),
        }
    }
}

impl FormOptions {
    /// Applies the keys present in `patch` over `self`.
    pub fn merged(mut self, patch: FormOptionsPatch) -> Self {
        if let Some(value) = patch.validate_on_blur {
            self.validate_on_blur = value;
        }
        if let Some(value) = patch.validate_on_input {
            self.validate_on_input = value;
        }
        if let Some(value) = patch.show_messages {
            self.show_messages = value;
        }
        if let Some(value) = patch.notice_duration_ms {
            self.notice_duration = Duration::from_millis(value);
        }
        if let Some(value) = patch.busy_label {
            self.busy_label = value;
        }
        if let Some(value) = patch.messages {
            self.messages = value;
        }
        self.extra.extend(patch.extra);
        self
    }
}

/// Partial options as supplied by a caller, usually from JSON.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormOptionsPatch {
    pub validate_on_blur: Option<bool>,
    pub validate_on_input: Option<bool>,
    pub show_messages: Option<bool>,
    pub notice_duration_ms: Option<u64>,
    pub busy_label: Option<String>,
    pub messages: Option<FormMessages>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl FormOptionsPatch {
    pub fn from_json(source: &str) -> FormResult<Self> {
        serde_json::from_str(source).map_err(|error| FormError::InvalidOptions(error.to_string()))
    }
}
