//! Indexwatch core: pure state machines for status polling and notification
//! slots, plus the job status model and view-model helpers.
mod effect;
mod msg;
mod notification;
mod slot;
mod state;
mod status;
mod update;
mod view_model;

pub use effect::{DismissReason, DropReason, PollEffect, SlotEffect};
pub use msg::{FetchFailure, PollMsg, SlotMsg};
pub use notification::{Notification, NotificationKind, LONG_DURATION, SHORT_DURATION};
pub use slot::{update_slot, Shown, Slot, SlotSettings, DEBOUNCE_WINDOW};
pub use state::{
    PollSession, PollState, RetryPolicy, TerminalReason, MAX_RETRY_INTERVAL, POLL_INTERVAL,
};
pub use status::{
    JobKey, JobStatus, ParentMode, Phase, RuleSummary, SegmentationMode, UnknownPhase,
};
pub use update::{update, LOGOUT_MESSAGE};
pub use view_model::{Activity, JobViewModel};
