use std::fmt::{Display, Formatter};

use rust_decimal::Decimal;

use super::constraint::{Constraints, ValidityState};
use crate::feedback::NoticeKind;

/// Position of a field in the form, in document order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldHandle(pub usize);

impl Display for FieldHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldTag {
    Input,
    Select,
    Textarea,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputType {
    Text,
    Search,
    Email,
    Tel,
    Url,
    Password,
    Number,
    Range,
    Date,
    Checkbox,
    Radio,
    File,
    Hidden,
}

impl InputType {
    /// Parses an HTML `type` attribute. Unknown values behave as `text`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "search" => Self::Search,
            "email" => Self::Email,
            "tel" => Self::Tel,
            "url" => Self::Url,
            "password" => Self::Password,
            "number" => Self::Number,
            "range" => Self::Range,
            "date" => Self::Date,
            "checkbox" => Self::Checkbox,
            "radio" => Self::Radio,
            "file" => Self::File,
            "hidden" => Self::Hidden,
            _ => Self::Text,
        }
    }

    pub fn is_checkable(self) -> bool {
        matches!(self, Self::Checkbox | Self::Radio)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Number | Self::Range)
    }

    /// Values the user does not type are never rewritten by cleaners.
    pub fn is_cleanable(self) -> bool {
        !matches!(self, Self::Checkbox | Self::Radio | Self::File)
    }
}

/// Static description of one input-capable element of the form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub handle: FieldHandle,
    pub id: Option<String>,
    pub name: Option<String>,
    pub tag: FieldTag,
    pub input_type: InputType,
    pub constraints: Constraints,
}

impl FieldDescriptor {
    pub fn input(name: impl Into<String>, input_type: InputType) -> Self {
        Self {
            handle: FieldHandle(0),
            id: None,
            name: Some(name.into()),
            tag: FieldTag::Input,
            input_type,
            constraints: Constraints::default(),
        }
    }

    pub fn textarea(name: impl Into<String>) -> Self {
        Self {
            tag: FieldTag::Textarea,
            ..Self::input(name, InputType::Text)
        }
    }

    pub fn select(name: impl Into<String>) -> Self {
        Self {
            tag: FieldTag::Select,
            ..Self::input(name, InputType::Text)
        }
    }

    pub fn unnamed(input_type: InputType) -> Self {
        Self {
            name: None,
            ..Self::input(String::new(), input_type)
        }
    }

    pub fn id(mut self, value: impl Into<String>) -> Self {
        self.id = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.constraints.required = true;
        self
    }

    pub fn min_length(mut self, value: usize) -> Self {
        self.constraints.min_length = Some(value);
        self
    }

    pub fn max_length(mut self, value: usize) -> Self {
        self.constraints.max_length = Some(value);
        self
    }

    pub fn min(mut self, value: impl Into<Decimal>) -> Self {
        self.constraints.min = Some(value.into());
        self
    }

    pub fn max(mut self, value: impl Into<Decimal>) -> Self {
        self.constraints.max = Some(value.into());
        self
    }

    pub fn step(mut self, value: impl Into<Decimal>) -> Self {
        self.constraints.step = Some(value.into());
        self
    }

    pub fn pattern(mut self, value: impl Into<String>) -> Self {
        self.constraints.pattern = Some(value.into());
        self
    }
}

/// Where an error slot is inserted relative to its field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SlotAnchor {
    AfterField,
    AfterUploadContainer,
    AfterGroup,
}

impl SlotAnchor {
    pub fn for_input(input_type: InputType) -> Self {
        match input_type {
            InputType::File => Self::AfterUploadContainer,
            InputType::Checkbox | InputType::Radio => Self::AfterGroup,
            _ => Self::AfterField,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum FormEventKind {
    Submit,
    Clear,
    Input,
    Blur,
    Change,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ListenTarget {
    Form,
    ClearControl,
    Field(FieldHandle),
}

/// Event forwarded from the host surface to [`super::FormController::dispatch`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FormEvent {
    Submit,
    Clear,
    Input(FieldHandle),
    Blur(FieldHandle),
    Change(FieldHandle),
}

impl FormEvent {
    pub fn kind(self) -> FormEventKind {
        match self {
            Self::Submit => FormEventKind::Submit,
            Self::Clear => FormEventKind::Clear,
            Self::Input(_) => FormEventKind::Input,
            Self::Blur(_) => FormEventKind::Blur,
            Self::Change(_) => FormEventKind::Change,
        }
    }
}

/// The form the controller is bound to.
///
/// Implementations wrap a platform form element (or an in-memory stand-in) and
/// take `&self` throughout, the way DOM handles do.
pub trait FormSurface {
    /// Input-capable fields in document order.
    fn fields(&self) -> Vec<FieldDescriptor>;

    fn field(&self, handle: FieldHandle) -> Option<FieldDescriptor> {
        self.fields()
            .into_iter()
            .find(|field| field.handle == handle)
    }

    fn value(&self, handle: FieldHandle) -> Option<String>;
    fn set_value(&self, handle: FieldHandle, value: &str);

    fn is_checked(&self, _handle: FieldHandle) -> bool {
        false
    }

    /// Constraint validity of `value` for `field`.
    ///
    /// Platform-backed surfaces may report native flags instead.
    fn validity(&self, field: &FieldDescriptor, value: &str) -> ValidityState {
        super::constraint::evaluate(field, value, self.is_checked(field.handle))
    }

    fn assign_id(&self, handle: FieldHandle, id: &str);
    fn disable_native_validation(&self);
    fn listen(&self, target: ListenTarget, kind: FormEventKind);
    fn reset(&self);
    fn focus(&self, handle: FieldHandle);

    /// Current label of the submit control, `None` when the form has none.
    fn submit_label(&self) -> Option<String>;
    fn set_submit_control(&self, enabled: bool, label: &str);

    fn has_clear_control(&self) -> bool {
        false
    }

    /// Name of the first selected file of a file input.
    fn selected_file_name(&self, _handle: FieldHandle) -> Option<String> {
        None
    }
}

/// Error slots, invalid markers and the global notice of a form.
pub trait DisplayLayer {
    fn has_error_slot(&self, field_id: &str) -> bool;
    fn create_error_slot(&self, field_id: &str, anchor: SlotAnchor);
    fn show_field_error(&self, field_id: &str, message: &str);
    fn hide_field_error(&self, field_id: &str);
    fn hide_all_field_errors(&self);

    /// Toggles the invalid class together with `aria-invalid`.
    fn mark_invalid(&self, field_id: &str, invalid: bool);

    /// Sets the label inside the upload container of a file input.
    fn show_file_name(&self, field_id: &str, label: &str);

    fn show_notice(&self, kind: NoticeKind, message: &str);
    fn hide_notice(&self);
}
