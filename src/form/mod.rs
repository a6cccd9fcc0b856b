mod clean;
mod constraint;
mod controller;
mod memory;
mod options;
mod surface;
mod validation;


pub use clean::CleanerKind;
pub use constraint::{Constraints, ValidityState, evaluate, validation_message};
pub use controller::{
    ConfigurationError, EventOutcome, FormController, FormControllerBuilder, FormData, FormError,
    FormResult, SubmitError, SubmitFuture, SubmitOutcome, SubmitState,
};
pub use memory::{ErrorSlot, InMemoryDisplay, InMemoryForm, NoticeSlot, SubmitControl};
pub use options::{FormMessages, FormOptions, FormOptionsPatch};
pub use surface::{
    DisplayLayer, FieldDescriptor, FieldHandle, FieldTag, FormEvent, FormEventKind, FormSurface,
    InputType, ListenTarget, SlotAnchor,
};
pub use validation::{FieldCleaner, FieldPredicate, FieldRule, ValidationPass};
