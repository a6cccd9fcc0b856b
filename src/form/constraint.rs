//! Constraint evaluation equivalent to HTML constraint validation.
//!
//! `value_missing` only looks at `required`. Every other flag is evaluated for
//! non-empty values only. Messages are derived in a fixed priority order:
//! missing value, type mismatch, too short, too long, range underflow, range
//! overflow, pattern mismatch. Anything else reports the generic message.

use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;
use url::Url;

use super::options::FormMessages;
use super::surface::{FieldDescriptor, FieldTag, InputType};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Constraints {
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
    pub step: Option<Decimal>,
    pub pattern: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ValidityState {
    pub value_missing: bool,
    pub type_mismatch: bool,
    pub too_short: bool,
    pub too_long: bool,
    pub range_underflow: bool,
    pub range_overflow: bool,
    pub pattern_mismatch: bool,
    pub step_mismatch: bool,
    pub bad_input: bool,
}

impl ValidityState {
    pub fn is_valid(&self) -> bool {
        !(self.value_missing
            || self.type_mismatch
            || self.too_short
            || self.too_long
            || self.range_underflow
            || self.range_overflow
            || self.pattern_mismatch
            || self.step_mismatch
            || self.bad_input)
    }
}

pub fn evaluate(field: &FieldDescriptor, value: &str, checked: bool) -> ValidityState {
    let mut validity = ValidityState::default();
    let constraints = &field.constraints;
    let input_type = field.input_type;

    if field.tag == FieldTag::Input && input_type == InputType::Hidden {
        return validity;
    }

    if constraints.required && supports_required(field) {
        validity.value_missing = if input_type.is_checkable() {
            !checked
        } else {
            value.is_empty()
        };
    }

    if value.is_empty() || field.tag == FieldTag::Select {
        return validity;
    }

    if field.tag == FieldTag::Textarea {
        check_length(constraints, value, &mut validity);
        return validity;
    }

    match input_type {
        InputType::Email => validity.type_mismatch = !is_simple_email(value),
        InputType::Url => validity.type_mismatch = !is_absolute_url(value),
        _ => {}
    }

    if supports_text_constraints(input_type) {
        check_length(constraints, value, &mut validity);
        if let Some(pattern) = constraints.pattern.as_deref().filter(|p| !p.is_empty()) {
            // Invalid patterns are ignored, as browsers do.
            if let Ok(regex) = Regex::new(&format!("^(?:{pattern})$")) {
                validity.pattern_mismatch = !regex.is_match(value);
            }
        }
    }

    if input_type.is_numeric() {
        check_range(constraints, value, &mut validity);
    }

    validity
}

/// Human-readable message for the first violated constraint.
pub fn validation_message(
    validity: &ValidityState,
    field: &FieldDescriptor,
    messages: &FormMessages,
) -> String {
    let constraints = &field.constraints;
    if validity.value_missing {
        return messages.required.clone();
    }
    if validity.type_mismatch {
        return match field.input_type {
            InputType::Email => messages.invalid_email.clone(),
            InputType::Url => messages.invalid_url.clone(),
            _ => messages.invalid_format.clone(),
        };
    }
    if validity.too_short {
        return interpolate(&messages.too_short, constraints.min_length);
    }
    if validity.too_long {
        return interpolate(&messages.too_long, constraints.max_length);
    }
    if validity.range_underflow {
        return interpolate(&messages.range_underflow, constraints.min);
    }
    if validity.range_overflow {
        return interpolate(&messages.range_overflow, constraints.max);
    }
    if validity.pattern_mismatch {
        return messages.pattern_mismatch.clone();
    }
    messages.invalid_field.clone()
}

fn interpolate<T: ToString>(template: &str, limit: Option<T>) -> String {
    let limit = limit.map(|value| value.to_string()).unwrap_or_default();
    template.replace("{limit}", &limit)
}

fn supports_required(field: &FieldDescriptor) -> bool {
    field.tag != FieldTag::Input || field.input_type != InputType::Range
}

fn supports_text_constraints(input_type: InputType) -> bool {
    matches!(
        input_type,
        InputType::Text
            | InputType::Search
            | InputType::Url
            | InputType::Tel
            | InputType::Email
            | InputType::Password
    )
}

fn check_length(constraints: &Constraints, value: &str, validity: &mut ValidityState) {
    let length = value.chars().count();
    if constraints.min_length.is_some_and(|min| length < min) {
        validity.too_short = true;
    }
    if constraints.max_length.is_some_and(|max| length > max) {
        validity.too_long = true;
    }
}

fn check_range(constraints: &Constraints, value: &str, validity: &mut ValidityState) {
    let Some(number) = parse_decimal(value) else {
        validity.bad_input = true;
        return;
    };
    if constraints.min.is_some_and(|min| number < min) {
        validity.range_underflow = true;
    }
    if constraints.max.is_some_and(|max| number > max) {
        validity.range_overflow = true;
    }
    if let Some(step) = constraints.step.filter(|step| *step > Decimal::ZERO) {
        let base = constraints.min.unwrap_or(Decimal::ZERO);
        if let Some(remainder) = number
            .checked_sub(base)
            .and_then(|offset| offset.checked_rem(step))
        {
            validity.step_mismatch = !remainder.is_zero();
        }
    }
}

pub(crate) fn parse_decimal(value: &str) -> Option<Decimal> {
    let value = value.trim();
    Decimal::from_str(value)
        .ok()
        .or_else(|| Decimal::from_scientific(value).ok())
}

fn is_email_local_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ".!#$%&'*+/=?^_`{|}~-".contains(ch)
}

fn is_email_domain_label(label: &str) -> bool {
    if label.is_empty() || label.len() > 63 {
        return false;
    }
    let bytes = label.as_bytes();
    bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
        && bytes[0].is_ascii_alphanumeric()
        && bytes[bytes.len() - 1].is_ascii_alphanumeric()
}

pub(crate) fn is_simple_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && local.chars().all(is_email_local_char)
        && domain.split('.').all(is_email_domain_label)
}

/// Absolute URL per the WHATWG parser, which is what `type=url` accepts.
pub(crate) fn is_absolute_url(value: &str) -> bool {
    Url::parse(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages() -> FormMessages {
        FormMessages::default()
    }

    #[test]
    fn required_is_the_only_check_for_empty_values() {
        let field = FieldDescriptor::input("email", InputType::Email)
            .required()
            .min_length(5)
            .pattern("[a-z]+@x");
        let validity = evaluate(&field, "", false);
        assert!(validity.value_missing);
        assert!(
            !validity.too_short && !validity.type_mismatch && !validity.pattern_mismatch
        );

        let optional = FieldDescriptor::input("email", InputType::Email).min_length(5);
        assert!(evaluate(&optional, "", false).is_valid());
    }

    #[test]
    fn checkable_required_means_checked() {
        let field = FieldDescriptor::input("terms", InputType::Checkbox).required();
        assert!(evaluate(&field, "on", false).value_missing);
        assert!(evaluate(&field, "on", true).is_valid());
    }

    #[test]
    fn type_mismatch_specializes_email_and_url() {
        let email = FieldDescriptor::input("email", InputType::Email);
        let validity = evaluate(&email, "not-an-email", false);
        assert!(validity.type_mismatch);
        assert_eq!(
            validation_message(&validity, &email, &messages()),
            "Enter a valid email."
        );
        assert!(evaluate(&email, "ana@example.com", false).is_valid());

        let url = FieldDescriptor::input("site", InputType::Url);
        let validity = evaluate(&url, "example.com", false);
        assert!(validity.type_mismatch);
        assert_eq!(
            validation_message(&validity, &url, &messages()),
            "Enter a valid URL."
        );
        assert!(evaluate(&url, "https://example.com/path", false).is_valid());
        assert!(!evaluate(&url, "https://", false).is_valid());
    }

    #[test]
    fn length_limits_are_interpolated() {
        let field = FieldDescriptor::input("nick", InputType::Text)
            .min_length(3)
            .max_length(5);
        let short = evaluate(&field, "ab", false);
        assert_eq!(
            validation_message(&short, &field, &messages()),
            "Minimum of 3 characters."
        );
        let long = evaluate(&field, "abcdef", false);
        assert_eq!(
            validation_message(&long, &field, &messages()),
            "Maximum of 5 characters."
        );
        assert!(evaluate(&field, "joão", false).is_valid());
    }

    #[test]
    fn textarea_checks_length_but_not_pattern() {
        let field = FieldDescriptor::textarea("bio").max_length(4).pattern("x");
        assert!(evaluate(&field, "abcde", false).too_long);
        assert!(evaluate(&field, "abc", false).is_valid());
    }

    #[test]
    fn numeric_range_and_step_use_exact_decimals() {
        let field = FieldDescriptor::input("age", InputType::Number)
            .min(18)
            .max(120);
        let under = evaluate(&field, "17", false);
        assert_eq!(
            validation_message(&under, &field, &messages()),
            "Minimum value: 18."
        );
        let over = evaluate(&field, "121", false);
        assert_eq!(
            validation_message(&over, &field, &messages()),
            "Maximum value: 120."
        );
        assert!(evaluate(&field, "45", false).is_valid());

        let price = FieldDescriptor::input("price", InputType::Number).step(Decimal::new(1, 1));
        assert!(evaluate(&price, "0.3", false).is_valid());
        assert!(evaluate(&price, "0.35", false).step_mismatch);

        let bad = evaluate(&field, "abc", false);
        assert!(bad.bad_input);
        assert_eq!(
            validation_message(&bad, &field, &messages()),
            "Invalid field."
        );
    }

    #[test]
    fn url_follows_whatwg_parsing() {
        let url = FieldDescriptor::input("site", InputType::Url);
        assert!(evaluate(&url, "http:example.com", false).is_valid());
        assert!(evaluate(&url, "mailto:ana@example.com", false).is_valid());
        assert!(evaluate(&url, "http://[::1", false).type_mismatch);
        assert!(evaluate(&url, "/relative/path", false).type_mismatch);
    }

    #[test]
    fn step_check_survives_values_at_decimal_limits() {
        let field = FieldDescriptor::input("offset", InputType::Number)
            .min(-10)
            .step(1);
        let validity = evaluate(&field, "79228162514264337593543950335", false);
        assert!(!validity.range_underflow);
        assert!(!validity.step_mismatch);
        assert!(evaluate(&field, "-7", false).is_valid());
        assert!(evaluate(&field, "-7.5", false).step_mismatch);
    }

    #[test]
    fn pattern_is_anchored_and_invalid_patterns_are_ignored() {
        let field = FieldDescriptor::input("code", InputType::Text).pattern("[0-9]{3}");
        assert!(evaluate(&field, "123", false).is_valid());
        assert!(evaluate(&field, "1234", false).pattern_mismatch);

        let broken = FieldDescriptor::input("code", InputType::Text).pattern("([");
        assert!(evaluate(&broken, "anything", false).is_valid());
    }

    #[test]
    fn first_violated_constraint_wins() {
        let field = FieldDescriptor::input("code", InputType::Text)
            .min_length(4)
            .pattern("[0-9]+");
        let validity = evaluate(&field, "ab", false);
        assert!(validity.too_short && validity.pattern_mismatch);
        assert_eq!(
            validation_message(&validity, &field, &messages()),
            "Minimum of 4 characters."
        );
    }

    #[test]
    fn hidden_inputs_never_fail() {
        let field = FieldDescriptor::input("token", InputType::Hidden).required();
        assert!(evaluate(&field, "", false).is_valid());
    }
}
