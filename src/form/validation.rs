use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use tracing::trace;

use super::clean::CleanerKind;
use super::constraint::validation_message;
use super::controller::{FormController, FormError, FormResult, read_lock, write_lock};
use super::surface::{DisplayLayer, FieldDescriptor, FieldHandle, FormSurface};

pub trait FieldCleaner: Send + Sync {
    fn clean(&self, value: &str) -> String;
}

impl<F> FieldCleaner for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn clean(&self, value: &str) -> String {
        (self)(value)
    }
}

pub trait FieldPredicate: Send + Sync {
    fn accepts(&self, value: &str) -> bool;
}

impl<F> FieldPredicate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn accepts(&self, value: &str) -> bool {
        (self)(value)
    }
}

/// Cleaner, validator and message bound to one field name.
#[derive(Clone, Default)]
pub struct FieldRule {
    cleaner: Option<Arc<dyn FieldCleaner>>,
    validator: Option<Arc<dyn FieldPredicate>>,
    message: Option<String>,
}

impl FieldRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cleaner(mut self, cleaner: impl FieldCleaner + 'static) -> Self {
        self.cleaner = Some(Arc::new(cleaner));
        self
    }

    pub fn validator(mut self, validator: impl FieldPredicate + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn has_cleaner(&self) -> bool {
        self.cleaner.is_some()
    }

    pub fn has_validator(&self) -> bool {
        self.validator.is_some()
    }

    pub fn configured_message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn clean(&self, value: &str) -> Option<String> {
        self.cleaner.as_ref().map(|cleaner| cleaner.clean(value))
    }

    /// A rule without a validator accepts every value.
    pub fn accepts(&self, value: &str) -> bool {
        self.validator
            .as_ref()
            .is_none_or(|validator| validator.accepts(value))
    }
}

impl Debug for FieldRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldRule")
            .field("cleaner", &self.cleaner.is_some())
            .field("validator", &self.validator.is_some())
            .field("message", &self.message)
            .finish()
    }
}

/// Whether a validation run normalizes the value first.
///
/// Input events only check so text is not rewritten while the user types.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationPass {
    CheckOnly,
    CleanThenCheck,
}

impl<S, D> FormController<S, D>
where
    S: FormSurface + 'static,
    D: DisplayLayer + 'static,
{
    /// Registers the rule for `name`, replacing any earlier one.
    pub fn add_field_rule(&self, name: impl Into<String>, rule: FieldRule) -> FormResult<&Self> {
        let name = name.into();
        let mut rules = write_lock(&self.rules, "registering field rule")?;
        if rules.insert(name.clone(), Arc::new(rule)).is_some() {
            trace!(field = %name, "field rule replaced");
        }
        Ok(self)
    }

    pub fn field_rule(&self, name: &str) -> FormResult<Option<FieldRule>> {
        Ok(read_lock(&self.rules, "reading field rule")?
            .get(name)
            .map(|rule| rule.as_ref().clone()))
    }

    /// Applies the registered cleaner, or the built-in one for the field's kind,
    /// and writes the result back. Returns the cleaned value.
    pub fn clean_field(&self, handle: FieldHandle) -> FormResult<String> {
        let field = self.field_descriptor(handle)?;
        self.clean_descriptor(&field)
    }

    pub fn validate_field(&self, handle: FieldHandle, pass: ValidationPass) -> FormResult<bool> {
        let field = self.field_descriptor(handle)?;
        self.validate_descriptor(&field, pass)
    }

    /// Cleans and checks every field. All fields are visited so every error slot
    /// reflects the current values.
    pub fn validate_form(&self) -> FormResult<bool> {
        let mut all_valid = true;
        for field in self.surface.fields() {
            if !self.validate_descriptor(&field, ValidationPass::CleanThenCheck)? {
                all_valid = false;
            }
        }
        Ok(all_valid)
    }

    /// Message of the last failed validation of `handle`, if it is still failing.
    pub fn field_error(&self, handle: FieldHandle) -> FormResult<Option<String>> {
        Ok(read_lock(&self.state, "reading field error")?
            .field_errors
            .get(&handle)
            .cloned())
    }

    fn field_descriptor(&self, handle: FieldHandle) -> FormResult<FieldDescriptor> {
        self.surface
            .field(handle)
            .ok_or(FormError::UnknownField(handle))
    }

    fn rule_for(&self, field: &FieldDescriptor) -> FormResult<Option<Arc<FieldRule>>> {
        let Some(name) = field.name.as_deref() else {
            return Ok(None);
        };
        Ok(read_lock(&self.rules, "reading field rules")?
            .get(name)
            .cloned())
    }

    fn clean_descriptor(&self, field: &FieldDescriptor) -> FormResult<String> {
        let current = self.surface.value(field.handle).unwrap_or_default();
        if !field.input_type.is_cleanable() {
            return Ok(current);
        }
        let cleaned = match self.rule_for(field)?.and_then(|rule| rule.clean(&current)) {
            Some(cleaned) => cleaned,
            None => CleanerKind::for_field(field.tag, field.input_type).apply(&current),
        };
        if cleaned != current {
            self.surface.set_value(field.handle, &cleaned);
        }
        Ok(cleaned)
    }

    fn validate_descriptor(
        &self,
        field: &FieldDescriptor,
        pass: ValidationPass,
    ) -> FormResult<bool> {
        let value = match pass {
            ValidationPass::CleanThenCheck => self.clean_descriptor(field)?,
            ValidationPass::CheckOnly => self.surface.value(field.handle).unwrap_or_default(),
        };

        let validity = self.surface.validity(field, &value);
        let failure = if !validity.is_valid() {
            Some(validation_message(&validity, field, &self.options.messages))
        } else {
            self.rule_for(field)?
                .filter(|rule| !rule.accepts(&value))
                .map(|rule| {
                    rule.configured_message()
                        .unwrap_or(&self.options.messages.invalid_field)
                        .to_owned()
                })
        };

        let field_id = self.ensure_field_id(field);
        match &failure {
            Some(message) => {
                self.display.mark_invalid(&field_id, true);
                if self.options.show_messages {
                    self.display.show_field_error(&field_id, message);
                }
            }
            None => {
                self.display.hide_field_error(&field_id);
                self.display.mark_invalid(&field_id, false);
            }
        }
        trace!(field = %field_id, valid = failure.is_none(), "field validated");

        let mut state = write_lock(&self.state, "recording field validation result")?;
        let valid = failure.is_none();
        match failure {
            Some(message) => {
                state.field_errors.insert(field.handle, message);
            }
            None => {
                state.field_errors.remove(&field.handle);
            }
        }
        Ok(valid)
    }
}
