use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::surface::{
    DisplayLayer, FieldDescriptor, FieldHandle, FormEventKind, FormSurface, ListenTarget,
    SlotAnchor,
};
use crate::feedback::NoticeKind;
use crate::id::error_slot_id;

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[derive(Clone, Debug)]
struct FieldEntry {
    descriptor: FieldDescriptor,
    value: String,
    initial_value: String,
    checked: bool,
    initial_checked: bool,
    selected_file: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubmitControl {
    pub label: String,
    pub enabled: bool,
}

#[derive(Debug)]
struct FormSurfaceState {
    fields: Vec<FieldEntry>,
    listeners: Vec<(ListenTarget, FormEventKind)>,
    native_validation: bool,
    submit_control: Option<SubmitControl>,
    clear_control: bool,
    focused: Option<FieldHandle>,
}

/// Headless form surface. Clones share the same form.
#[derive(Clone, Debug)]
pub struct InMemoryForm {
    state: Arc<RwLock<FormSurfaceState>>,
}

impl Default for InMemoryForm {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryForm {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(FormSurfaceState {
                fields: Vec::new(),
                listeners: Vec::new(),
                native_validation: true,
                submit_control: None,
                clear_control: false,
                focused: None,
            })),
        }
    }

    /// Appends a field whose pristine value is `initial_value`.
    pub fn with_field(
        self,
        descriptor: FieldDescriptor,
        initial_value: impl Into<String>,
    ) -> Self {
        self.push_field(descriptor, initial_value.into(), false);
        self
    }

    pub fn with_checkable(
        self,
        descriptor: FieldDescriptor,
        value: impl Into<String>,
        checked: bool,
    ) -> Self {
        self.push_field(descriptor, value.into(), checked);
        self
    }

    pub fn with_submit_control(self, label: impl Into<String>) -> Self {
        write(&self.state).submit_control = Some(SubmitControl {
            label: label.into(),
            enabled: true,
        });
        self
    }

    pub fn with_clear_control(self) -> Self {
        write(&self.state).clear_control = true;
        self
    }

    fn push_field(&self, mut descriptor: FieldDescriptor, value: String, checked: bool) {
        let mut state = write(&self.state);
        descriptor.handle = FieldHandle(state.fields.len());
        state.fields.push(FieldEntry {
            descriptor,
            initial_value: value.clone(),
            value,
            checked,
            initial_checked: checked,
            selected_file: None,
        });
    }

    pub fn handle_of(&self, name: &str) -> Option<FieldHandle> {
        read(&self.state)
            .fields
            .iter()
            .find(|entry| entry.descriptor.name.as_deref() == Some(name))
            .map(|entry| entry.descriptor.handle)
    }

    pub fn set_checked(&self, handle: FieldHandle, checked: bool) {
        if let Some(entry) = write(&self.state).fields.get_mut(handle.0) {
            entry.checked = checked;
        }
    }

    /// Simulates picking a file, or emptying the selection with `None`.
    pub fn select_file(&self, handle: FieldHandle, file_name: Option<&str>) {
        if let Some(entry) = write(&self.state).fields.get_mut(handle.0) {
            entry.selected_file = file_name.map(str::to_owned);
            entry.value = file_name.unwrap_or_default().to_owned();
        }
    }

    pub fn listeners(&self) -> Vec<(ListenTarget, FormEventKind)> {
        read(&self.state).listeners.clone()
    }

    pub fn native_validation_enabled(&self) -> bool {
        read(&self.state).native_validation
    }

    pub fn submit_control(&self) -> Option<SubmitControl> {
        read(&self.state).submit_control.clone()
    }

    pub fn focused(&self) -> Option<FieldHandle> {
        read(&self.state).focused
    }
}

impl FormSurface for InMemoryForm {
    fn fields(&self) -> Vec<FieldDescriptor> {
        read(&self.state)
            .fields
            .iter()
            .map(|entry| entry.descriptor.clone())
            .collect()
    }

    fn field(&self, handle: FieldHandle) -> Option<FieldDescriptor> {
        read(&self.state)
            .fields
            .get(handle.0)
            .map(|entry| entry.descriptor.clone())
    }

    fn value(&self, handle: FieldHandle) -> Option<String> {
        read(&self.state)
            .fields
            .get(handle.0)
            .map(|entry| entry.value.clone())
    }

    fn set_value(&self, handle: FieldHandle, value: &str) {
        if let Some(entry) = write(&self.state).fields.get_mut(handle.0) {
            entry.value = value.to_owned();
        }
    }

    fn is_checked(&self, handle: FieldHandle) -> bool {
        read(&self.state)
            .fields
            .get(handle.0)
            .is_some_and(|entry| entry.checked)
    }

    fn assign_id(&self, handle: FieldHandle, id: &str) {
        if let Some(entry) = write(&self.state).fields.get_mut(handle.0) {
            entry.descriptor.id = Some(id.to_owned());
        }
    }

    fn disable_native_validation(&self) {
        write(&self.state).native_validation = false;
    }

    fn listen(&self, target: ListenTarget, kind: FormEventKind) {
        write(&self.state).listeners.push((target, kind));
    }

    fn reset(&self) {
        for entry in &mut write(&self.state).fields {
            entry.value = entry.initial_value.clone();
            entry.checked = entry.initial_checked;
            entry.selected_file = None;
        }
    }

    fn focus(&self, handle: FieldHandle) {
        write(&self.state).focused = Some(handle);
    }

    fn submit_label(&self) -> Option<String> {
        read(&self.state)
            .submit_control
            .as_ref()
            .map(|control| control.label.clone())
    }

    fn set_submit_control(&self, enabled: bool, label: &str) {
        if let Some(control) = write(&self.state).submit_control.as_mut() {
            control.enabled = enabled;
            control.label = label.to_owned();
        }
    }

    fn has_clear_control(&self) -> bool {
        read(&self.state).clear_control
    }

    fn selected_file_name(&self, handle: FieldHandle) -> Option<String> {
        read(&self.state)
            .fields
            .get(handle.0)
            .and_then(|entry| entry.selected_file.clone())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ErrorSlot {
    pub field_id: String,
    pub anchor: SlotAnchor,
    pub text: String,
    pub visible: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NoticeSlot {
    pub kind: NoticeKind,
    pub text: String,
    pub visible: bool,
}

#[derive(Debug, Default)]
struct DisplayState {
    slots: BTreeMap<String, ErrorSlot>,
    invalid: BTreeSet<String>,
    file_labels: BTreeMap<String, String>,
    notice: Option<NoticeSlot>,
}

/// Headless display layer keyed by slot id. Clones share the same state.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDisplay {
    state: Arc<RwLock<DisplayState>>,
}

impl InMemoryDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error_slot(&self, field_id: &str) -> Option<ErrorSlot> {
        read(&self.state).slots.get(&error_slot_id(field_id)).cloned()
    }

    /// Text of the slot when it is visible.
    pub fn visible_error(&self, field_id: &str) -> Option<String> {
        self.error_slot(field_id)
            .filter(|slot| slot.visible)
            .map(|slot| slot.text)
    }

    pub fn slot_count(&self) -> usize {
        read(&self.state).slots.len()
    }

    pub fn is_marked_invalid(&self, field_id: &str) -> bool {
        read(&self.state).invalid.contains(field_id)
    }

    pub fn invalid_count(&self) -> usize {
        read(&self.state).invalid.len()
    }

    pub fn file_label(&self, field_id: &str) -> Option<String> {
        read(&self.state).file_labels.get(field_id).cloned()
    }

    pub fn notice(&self) -> Option<NoticeSlot> {
        read(&self.state).notice.clone()
    }
}

impl DisplayLayer for InMemoryDisplay {
    fn has_error_slot(&self, field_id: &str) -> bool {
        read(&self.state).slots.contains_key(&error_slot_id(field_id))
    }

    fn create_error_slot(&self, field_id: &str, anchor: SlotAnchor) {
        write(&self.state).slots.insert(
            error_slot_id(field_id),
            ErrorSlot {
                field_id: field_id.to_owned(),
                anchor,
                text: String::new(),
                visible: false,
            },
        );
    }

    fn show_field_error(&self, field_id: &str, message: &str) {
        if let Some(slot) = write(&self.state).slots.get_mut(&error_slot_id(field_id)) {
            slot.text = message.to_owned();
            slot.visible = true;
        }
    }

    fn hide_field_error(&self, field_id: &str) {
        if let Some(slot) = write(&self.state).slots.get_mut(&error_slot_id(field_id)) {
            slot.visible = false;
        }
    }

    fn hide_all_field_errors(&self) {
        for slot in write(&self.state).slots.values_mut() {
            slot.visible = false;
        }
    }

    fn mark_invalid(&self, field_id: &str, invalid: bool) {
        let mut state = write(&self.state);
        if invalid {
            state.invalid.insert(field_id.to_owned());
        } else {
            state.invalid.remove(field_id);
        }
    }

    fn show_file_name(&self, field_id: &str, label: &str) {
        write(&self.state)
            .file_labels
            .insert(field_id.to_owned(), label.to_owned());
    }

    fn show_notice(&self, kind: NoticeKind, message: &str) {
        write(&self.state).notice = Some(NoticeSlot {
            kind,
            text: message.to_owned(),
            visible: true,
        });
    }

    fn hide_notice(&self) {
        if let Some(notice) = write(&self.state).notice.as_mut() {
            notice.visible = false;
        }
    }
}
