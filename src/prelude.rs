pub use crate::feedback::{NoticeDismissal, NoticeKind};
pub use crate::form::{
    DisplayLayer, EventOutcome, FieldDescriptor, FieldHandle, FieldRule, FormController,
    FormData, FormError, FormEvent, FormOptions, FormOptionsPatch, FormResult, FormSurface,
    InputType, SubmitError, SubmitOutcome, ValidationPass,
};
