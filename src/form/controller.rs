use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::options::{FormOptions, FormOptionsPatch};
use super::surface::{
    DisplayLayer, FieldDescriptor, FieldHandle, FormEvent, FormEventKind, FormSurface, InputType,
    ListenTarget, SlotAnchor,
};
use super::validation::{FieldRule, ValidationPass};
use crate::feedback::{NoticeBoard, NoticeDismissal, NoticeKind};
use crate::id::field_auto_id;

/// Cleaned field values keyed by field name.
pub type FormData = BTreeMap<String, String>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitState {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("form surface is missing")]
    MissingSurface,
    #[error("display layer is missing")]
    MissingDisplay,
    #[error("submit handler is missing")]
    MissingSubmitHandler,
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum FormError {
    #[error("invalid form configuration: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("invalid form options: {0}")]
    InvalidOptions(String),
    #[error("form state lock poisoned while {0}")]
    StatePoisoned(&'static str),
    #[error("invalid submit state transition: {from:?} -> {to:?}")]
    InvalidStateTransition { from: SubmitState, to: SubmitState },
    #[error("unknown field {0}")]
    UnknownField(FieldHandle),
}

pub type FormResult<T> = Result<T, FormError>;

/// Failure reported by the submit handler.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("{message}")]
pub struct SubmitError {
    message: String,
}

impl SubmitError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for SubmitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for SubmitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

pub type SubmitFuture = LocalBoxFuture<'static, Result<(), SubmitError>>;
pub(super) type SubmitHandler = Arc<dyn Fn(FormData) -> SubmitFuture>;

#[derive(Debug)]
pub enum SubmitOutcome {
    /// A submission was already in flight; the trigger was dropped.
    Ignored,
    /// Validation failed; the handler was not called.
    Rejected { first_invalid: Option<FieldHandle> },
    Succeeded { notice: Option<NoticeDismissal> },
    Failed { message: String },
}

#[derive(Debug)]
pub enum EventOutcome {
    Validated(bool),
    Submitted(SubmitOutcome),
    Cleared,
    /// The event kind is not wired under the current options.
    Ignored,
}

pub(super) struct FormState {
    pub(super) submit_state: SubmitState,
    pub(super) submit_count: u32,
    pub(super) field_errors: BTreeMap<FieldHandle, String>,
}

pub struct FormController<S, D> {
    pub(super) options: Arc<FormOptions>,
    pub(super) surface: Arc<S>,
    pub(super) display: Arc<D>,
    pub(super) on_submit: SubmitHandler,
    pub(super) rules: Arc<RwLock<BTreeMap<String, Arc<FieldRule>>>>,
    pub(super) state: Arc<RwLock<FormState>>,
    pub(super) notices: NoticeBoard,
}

impl<S, D> Clone for FormController<S, D> {
    fn clone(&self) -> Self {
        Self {
            options: self.options.clone(),
            surface: self.surface.clone(),
            display: self.display.clone(),
            on_submit: self.on_submit.clone(),
            rules: self.rules.clone(),
            state: self.state.clone(),
            notices: self.notices.clone(),
        }
    }
}

pub struct FormControllerBuilder<S, D> {
    surface: Option<S>,
    display: Option<D>,
    on_submit: Option<SubmitHandler>,
    options: FormOptions,
    rules: Vec<(String, FieldRule)>,
}

impl<S, D> Default for FormControllerBuilder<S, D> {
    fn default() -> Self {
        Self {
            surface: None,
            display: None,
            on_submit: None,
            options: FormOptions::default(),
            rules: Vec::new(),
        }
    }
}

impl<S, D> FormControllerBuilder<S, D>
where
    S: FormSurface + 'static,
    D: DisplayLayer + 'static,
{
    pub fn surface(mut self, surface: S) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn display(mut self, display: D) -> Self {
        self.display = Some(display);
        self
    }

    pub fn on_submit<F, Fut, E>(mut self, handler: F) -> Self
    where
        F: Fn(FormData) -> Fut + 'static,
        Fut: Future<Output = Result<(), E>> + 'static,
        E: Display + 'static,
    {
        let handler: SubmitHandler = Arc::new(move |data| {
            handler(data)
                .map(|result| result.map_err(|error| SubmitError::new(error.to_string())))
                .boxed_local()
        });
        self.on_submit = Some(handler);
        self
    }

    pub fn options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    /// Merges caller-supplied keys over the current options.
    pub fn patch(mut self, patch: FormOptionsPatch) -> Self {
        self.options = self.options.merged(patch);
        self
    }

    pub fn rule(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        self.rules.push((name.into(), rule));
        self
    }

    pub fn build(self) -> FormResult<FormController<S, D>> {
        let surface = self.surface.ok_or(ConfigurationError::MissingSurface)?;
        let display = self.display.ok_or(ConfigurationError::MissingDisplay)?;
        let on_submit = self
            .on_submit
            .ok_or(ConfigurationError::MissingSubmitHandler)?;

        let controller = FormController {
            options: Arc::new(self.options),
            surface: Arc::new(surface),
            display: Arc::new(display),
            on_submit,
            rules: Arc::new(RwLock::new(BTreeMap::new())),
            state: Arc::new(RwLock::new(FormState {
                submit_state: SubmitState::Idle,
                submit_count: 0,
                field_errors: BTreeMap::new(),
            })),
            notices: NoticeBoard::default(),
        };
        for (name, rule) in self.rules {
            controller.add_field_rule(name, rule)?;
        }
        controller.setup()?;
        Ok(controller)
    }
}

impl<S, D> FormController<S, D>
where
    S: FormSurface + 'static,
    D: DisplayLayer + 'static,
{
    pub fn builder() -> FormControllerBuilder<S, D> {
        FormControllerBuilder::default()
    }

    pub fn new<F, Fut, E>(
        surface: S,
        display: D,
        on_submit: F,
        options: FormOptions,
    ) -> FormResult<Self>
    where
        F: Fn(FormData) -> Fut + 'static,
        Fut: Future<Output = Result<(), E>> + 'static,
        E: Display + 'static,
    {
        Self::builder()
            .surface(surface)
            .display(display)
            .on_submit(on_submit)
            .options(options)
            .build()
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    fn setup(&self) -> FormResult<()> {
        self.surface.disable_native_validation();
        self.surface.listen(ListenTarget::Form, FormEventKind::Submit);

        let fields = self.surface.fields();
        for field in &fields {
            let target = ListenTarget::Field(field.handle);
            if self.options.validate_on_blur {
                self.surface.listen(target, FormEventKind::Blur);
            }
            if self.options.validate_on_input {
                self.surface.listen(target, FormEventKind::Input);
            }
            self.surface.listen(target, FormEventKind::Change);
        }
        if self.surface.has_clear_control() {
            self.surface
                .listen(ListenTarget::ClearControl, FormEventKind::Clear);
        }

        let created = self.ensure_error_slots();
        debug!(fields = fields.len(), created, "form controller attached");
        Ok(())
    }

    /// Creates the missing error slots and returns how many were created.
    pub fn ensure_error_slots(&self) -> usize {
        let mut created = 0;
        for field in self.surface.fields() {
            let field_id = self.ensure_field_id(&field);
            if !self.display.has_error_slot(&field_id) {
                self.display
                    .create_error_slot(&field_id, SlotAnchor::for_input(field.input_type));
                created += 1;
            }
        }
        created
    }

    pub(super) fn ensure_field_id(&self, field: &FieldDescriptor) -> String {
        if let Some(id) = field.id.as_deref().filter(|id| !id.is_empty()) {
            return id.to_owned();
        }
        let id = field_auto_id(field.name.as_deref(), field.handle.0);
        self.surface.assign_id(field.handle, &id);
        id
    }

    pub fn submit_state(&self) -> FormResult<SubmitState> {
        Ok(read_lock(&self.state, "reading submit state")?.submit_state)
    }

    /// True while the submit handler is in flight. Triggers are also ignored
    /// during the validation that precedes it; see [`Self::submit_state`].
    pub fn is_submitting(&self) -> FormResult<bool> {
        Ok(self.submit_state()? == SubmitState::Submitting)
    }

    /// Number of submit attempts that got past the in-flight guard.
    pub fn submit_count(&self) -> FormResult<u32> {
        Ok(read_lock(&self.state, "reading submit count")?.submit_count)
    }

    pub async fn dispatch(&self, event: FormEvent) -> FormResult<EventOutcome> {
        match event {
            FormEvent::Submit => Ok(EventOutcome::Submitted(self.submit().await?)),
            FormEvent::Clear => {
                self.clear_form()?;
                Ok(EventOutcome::Cleared)
            }
            FormEvent::Input(handle) if self.options.validate_on_input => Ok(
                EventOutcome::Validated(self.validate_field(handle, ValidationPass::CheckOnly)?),
            ),
            FormEvent::Blur(handle) if self.options.validate_on_blur => Ok(EventOutcome::Validated(
                self.validate_field(handle, ValidationPass::CleanThenCheck)?,
            )),
            FormEvent::Change(handle) => {
                self.refresh_file_name(handle)?;
                Ok(EventOutcome::Validated(
                    self.validate_field(handle, ValidationPass::CleanThenCheck)?,
                ))
            }
            FormEvent::Input(_) | FormEvent::Blur(_) => Ok(EventOutcome::Ignored),
        }
    }

    pub async fn submit(&self) -> FormResult<SubmitOutcome> {
        let Some(mut guard) = SubmitGuard::acquire(&self.state, self.surface.as_ref())? else {
            debug!("submit ignored: a submission is already in flight");
            return Ok(SubmitOutcome::Ignored);
        };

        if !self.validate_form()? {
            let first_invalid = self.focus_first_error()?;
            debug!(?first_invalid, "submit rejected by validation");
            return Ok(SubmitOutcome::Rejected { first_invalid });
        }

        guard.begin_submitting(&self.options.busy_label)?;
        let data = self.form_data();
        let field_count = data.len();
        let result = (self.on_submit)(data).await;

        match result {
            Ok(()) => {
                guard.finish(SubmitState::Succeeded)?;
                info!(fields = field_count, "form submitted");
                let notice = self.show_transient_notice(
                    NoticeKind::Success,
                    &self.options.messages.submit_success,
                );
                self.clear_form()?;
                Ok(SubmitOutcome::Succeeded { notice })
            }
            Err(error) => {
                guard.finish(SubmitState::Failed)?;
                let message = error.message().to_owned();
                warn!(error = %message, "form submission failed");
                self.show_notice(
                    NoticeKind::Error,
                    &self.options.messages.submit_failed(&message),
                );
                Ok(SubmitOutcome::Failed { message })
            }
        }
    }

    /// Focuses the first invalid field in the order the surface lists them.
    pub fn focus_first_error(&self) -> FormResult<Option<FieldHandle>> {
        let first = {
            let state = read_lock(&self.state, "reading first invalid field")?;
            self.surface
                .fields()
                .into_iter()
                .map(|field| field.handle)
                .find(|handle| state.field_errors.contains_key(handle))
        };
        if let Some(handle) = first {
            self.surface.focus(handle);
        }
        Ok(first)
    }

    /// Resets values to pristine and removes every error message and marker.
    pub fn clear_form(&self) -> FormResult<()> {
        self.surface.reset();
        self.display.hide_all_field_errors();
        for field in self.surface.fields() {
            let field_id = self.ensure_field_id(&field);
            self.display.mark_invalid(&field_id, false);
            if field.input_type == InputType::File {
                self.display
                    .show_file_name(&field_id, &self.options.messages.no_file_selected);
            }
        }
        write_lock(&self.state, "clearing field errors")?
            .field_errors
            .clear();
        Ok(())
    }

    /// Shows the selected file name of a file input, or the placeholder when
    /// the selection is empty. Other fields are left alone.
    pub fn refresh_file_name(&self, handle: FieldHandle) -> FormResult<()> {
        let field = self
            .surface
            .field(handle)
            .ok_or(FormError::UnknownField(handle))?;
        if field.input_type != InputType::File {
            return Ok(());
        }
        let field_id = self.ensure_field_id(&field);
        let selected = self.surface.selected_file_name(handle);
        let label = selected
            .as_deref()
            .unwrap_or(&self.options.messages.no_file_selected);
        self.display.show_file_name(&field_id, label);
        Ok(())
    }

    /// Current values of named fields. Unchecked checkboxes and radios are left out
    /// and a repeated name keeps its last value.
    pub fn form_data(&self) -> FormData {
        let mut data = FormData::new();
        for field in self.surface.fields() {
            let Some(name) = field.name.as_deref().filter(|name| !name.is_empty()) else {
                continue;
            };
            if field.input_type.is_checkable() && !self.surface.is_checked(field.handle) {
                continue;
            }
            let mut value = self.surface.value(field.handle).unwrap_or_default();
            if value.is_empty() && field.input_type.is_checkable() {
                value = "on".to_owned();
            }
            data.insert(name.to_owned(), value);
        }
        data
    }

    fn show_notice(&self, kind: NoticeKind, message: &str) {
        if !self.options.show_messages {
            return;
        }
        self.notices.issue();
        self.display.show_notice(kind, message);
    }

    fn show_transient_notice(&self, kind: NoticeKind, message: &str) -> Option<NoticeDismissal> {
        if !self.options.show_messages {
            return None;
        }
        let ticket = self.notices.issue();
        self.display.show_notice(kind, message);
        let display = self.display.clone();
        Some(NoticeDismissal::new(
            self.options.notice_duration,
            ticket,
            self.notices.clone(),
            move || display.hide_notice(),
        ))
    }
}

/// Holds the in-flight slot for one submit attempt.
///
/// Dropping it returns the form to `Idle` and restores the submit control, on
/// every exit path.
struct SubmitGuard<'a, S: FormSurface> {
    state: &'a RwLock<FormState>,
    surface: &'a S,
    original_label: Option<String>,
}

impl<'a, S: FormSurface> SubmitGuard<'a, S> {
    fn acquire(state: &'a RwLock<FormState>, surface: &'a S) -> FormResult<Option<Self>> {
        let mut current = write_lock(state, "acquiring submit guard")?;
        if current.submit_state != SubmitState::Idle {
            return Ok(None);
        }
        transition_submit_state(&mut current, SubmitState::Validating)?;
        current.submit_count = current.submit_count.saturating_add(1);
        Ok(Some(Self {
            state,
            surface,
            original_label: None,
        }))
    }

    fn begin_submitting(&mut self, busy_label: &str) -> FormResult<()> {
        transition_submit_state(
            &mut *write_lock(self.state, "moving submit state to submitting")?,
            SubmitState::Submitting,
        )?;
        if let Some(label) = self.surface.submit_label() {
            self.surface.set_submit_control(false, busy_label);
            self.original_label = Some(label);
        }
        Ok(())
    }

    fn finish(&mut self, next: SubmitState) -> FormResult<()> {
        transition_submit_state(&mut *write_lock(self.state, "completing submit")?, next)
    }
}

impl<S: FormSurface> Drop for SubmitGuard<'_, S> {
    fn drop(&mut self) {
        let mut state = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.submit_state = SubmitState::Idle;
        drop(state);
        if let Some(label) = self.original_label.take() {
            self.surface.set_submit_control(true, &label);
        }
    }
}

pub(super) fn transition_submit_state(state: &mut FormState, next: SubmitState) -> FormResult<()> {
    let current = state.submit_state;
    if current == next {
        return Ok(());
    }

    let allowed = matches!(
        (current, next),
        (SubmitState::Idle, SubmitState::Validating)
            | (SubmitState::Validating, SubmitState::Submitting)
            | (SubmitState::Submitting, SubmitState::Succeeded)
            | (SubmitState::Submitting, SubmitState::Failed)
            | (_, SubmitState::Idle)
    );
    if !allowed {
        return Err(FormError::InvalidStateTransition {
            from: current,
            to: next,
        });
    }
    state.submit_state = next;
    Ok(())
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
