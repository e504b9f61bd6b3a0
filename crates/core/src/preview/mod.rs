//! Keeping the live preview in step with the parameter form.

pub mod debounce;
pub mod fields;
pub mod form;
pub mod scripts;
pub mod sync;

pub use debounce::{DebounceTicket, Deadline, Debouncer};
pub use fields::{FieldEvent, ValueGate, WidgetKind};
pub use form::{MULTI_VALUE_SUFFIX, collect_params};
pub use scripts::{
    DocumentSnapshot, EventTarget, LifecycleEvent, RevivePlan, ReviveStep, ScriptId, ScriptNode,
    ScriptRunner, USER_SCRIPT_ATTR, execute_revival, plan_revival, prepare_external, wrap_isolated,
};
pub use sync::{
    Notice, NoticeLevel, PendingRender, PreviewSync, RenderBackend, RenderError, RequestTicket,
    UpdateOutcome, run_reset, run_update,
};
